//! Presto Music product pages.
//!
//! Presto marks its pages up semantically (`c-product-block__*`,
//! `c-tracklist__*`), so everything is read with plain selectors. Tracks
//! are numbered sequentially on disc 1 in document order.

use partitura_core::model::{Album, Artist, Edition, Track};
use partitura_core::names::dedup_artists;
use partitura_core::normalize::{missing_title, missing_year};
use partitura_core::roles::infer;
use partitura_core::text::{clean, clean_name, normalize_whitespace};
use partitura_core::ExtractionResult;

use super::first_year;
use super::markup::{Document, Element};
use crate::draft::Draft;
use crate::error::ExtractResult;

/// Source label recorded on Presto-built results.
pub const SOURCE: &str = "presto";

/// Composer used when a work credits nobody.
pub const ANONYMOUS: &str = "Anonymous";

const TITLE_SUFFIX: &str = " | Presto Music";

/// Build a draft album from a Presto product page.
pub fn extract(body: &str) -> ExtractResult<ExtractionResult> {
    let doc = Document::parse(body);
    let mut draft = Draft::default();
    let mut album = Album::default();

    match title(&doc) {
        Some((title, from)) => {
            draft.note(format!("title from {from}"));
            album.title = title;
        }
        None => draft.error(missing_title()),
    }

    let metadata = metadata_items(&doc);
    match metadata_value(&metadata, "release date").and_then(first_year) {
        Some(year) => album.original_year = year,
        None => draft.error(missing_year()),
    }

    let label = metadata_value(&metadata, "label").map(str::to_string);
    let catalog = metadata_value(&metadata, "catalogue number").map(str::to_string);
    if label.is_some() || catalog.is_some() {
        album.edition = Some(Edition::new(
            label.unwrap_or_default(),
            catalog.unwrap_or_default(),
            album.original_year,
        ));
    }

    album.album_artist = album_performers(&metadata, &mut draft);
    album.tracks = tracks(&doc, &mut draft);

    log::info!(
        "presto: '{}' with {} tracks and {} performers",
        album.title,
        album.tracks.len(),
        album.album_artist.len()
    );
    Ok(draft.finish(album, SOURCE))
}

// ---------------------------------------------------------------------------
// Album fields
// ---------------------------------------------------------------------------

/// The album title and where it came from, in priority order.
fn title(doc: &Document<'_>) -> Option<(String, &'static str)> {
    if let Some(content) = doc
        .select_first("meta[property=og:title]")
        .and_then(|meta| meta.attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Some((content.to_string(), "og:title"));
    }

    if let Some(text) = doc
        .select_first("h1.c-product-block__title")
        .map(|h1| h1.text())
        .filter(|t| !t.is_empty())
    {
        return Some((text, "page heading"));
    }

    doc.select_first("title")
        .map(|t| title_from_page_title(&t.text()))
        .filter(|t| !t.is_empty())
        .map(|t| (t, "page title"))
}

fn title_from_page_title(text: &str) -> String {
    let text = text.split(" - ").next().unwrap_or(text);
    let text = text.split(TITLE_SUFFIX).next().unwrap_or(text);
    normalize_whitespace(text)
}

/// `(label, value)` pairs from the product metadata list.
fn metadata_items(doc: &Document<'_>) -> Vec<(String, String)> {
    doc.select(".c-product-block__metadata li")
        .iter()
        .filter_map(|item| {
            let text = item.text();
            let (label, value) = text.split_once(':')?;
            Some((label.trim().to_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn metadata_value<'m>(items: &'m [(String, String)], label: &str) -> Option<&'m str> {
    items
        .iter()
        .find(|(l, v)| l == label && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

/// Explicit role word carried by a performer metadata label, or `None`
/// for generic labels such as `Artists` whose role comes from the name.
fn performer_label(label: &str) -> Option<Option<&'static str>> {
    let singular = label.trim_end_matches("(s)").trim_end_matches('s');
    match singular {
        "artist" | "performer" => Some(None),
        "conductor" => Some(Some("conductor")),
        "orchestra" => Some(Some("orchestra")),
        "choir" => Some(Some("choir")),
        "ensemble" => Some(Some("ensemble")),
        "soloist" => Some(Some("soloist")),
        _ => None,
    }
}

fn album_performers(items: &[(String, String)], draft: &mut Draft) -> Vec<Artist> {
    let mut performers = Vec::new();
    for (label, value) in items {
        let Some(credit) = performer_label(label) else {
            continue;
        };
        let separator = if value.contains(';') { ';' } else { ',' };
        for name in value.split(separator).map(clean_name) {
            if name.is_empty() {
                continue;
            }
            let inferred = infer(credit, &name);
            draft.note(format!(
                "role: {name} -> {} ({} confidence)",
                inferred.role, inferred.confidence
            ));
            performers.push(Artist::new(name, inferred.role));
        }
    }
    let (performers, warnings) = dedup_artists(performers);
    draft.warn_all(warnings);
    performers
}

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

fn tracks(doc: &Document<'_>, draft: &mut Draft) -> Vec<Track> {
    let mut tracks = Vec::new();
    let mut number = 0;

    for work in doc.select(".c-tracklist__work") {
        let movements = work.select(".c-track--track");
        if movements.is_empty() {
            let (composer, title) = flat_work(&work);
            number += 1;
            tracks.push(track(number, composer, title, draft));
            continue;
        }

        let (composer, parent_title) = parent_work(&work, &movements);
        for movement in &movements {
            let movement_title = movement
                .select_first(".c-track__title")
                .map_or_else(|| movement.text(), |t| t.text());
            number += 1;
            tracks.push(track(
                number,
                composer.clone(),
                format!("{parent_title}: {movement_title}"),
                draft,
            ));
        }
        log::debug!(
            "presto: work '{parent_title}' flattened into {} movements",
            movements.len()
        );
    }
    tracks
}

fn track(number: u32, composer: Option<String>, title: String, draft: &mut Draft) -> Track {
    let composer = composer
        .map(|c| clean_name(&c))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| {
            draft.note(format!("track {number}: no composer credited; using {ANONYMOUS}"));
            ANONYMOUS.to_string()
        });
    Track::new(1, number, title).with_artist(Artist::composer(composer))
}

fn outside<'d, 'a>(
    candidates: Vec<Element<'d, 'a>>,
    excluded: &[Element<'d, 'a>],
) -> Option<Element<'d, 'a>> {
    candidates
        .into_iter()
        .find(|c| !excluded.iter().any(|e| e.contains(c)))
}

/// Composer and title of a multi-movement work's header.
fn parent_work<'d, 'a>(
    work: &Element<'d, 'a>,
    movements: &[Element<'d, 'a>],
) -> (Option<String>, String) {
    let title = outside(work.select(".c-track__title"), movements)
        .map(|t| t.text())
        .unwrap_or_default();
    let composer = outside(work.select("a[href*=composer]"), movements)
        .map(|a| a.text())
        .filter(|c| !c.is_empty());

    match composer {
        Some(composer) => (Some(composer), title),
        None => split_composer(&title),
    }
}

/// Composer and title of a single-track work.
fn flat_work(work: &Element<'_, '_>) -> (Option<String>, String) {
    let text = work
        .select_first(".c-track__title")
        .map_or_else(|| work.text(), |t| t.text());

    let composer = work
        .select_first("a[href*=composer]")
        .map(|a| a.text())
        .filter(|c| !c.is_empty());
    let Some(composer) = composer else {
        return split_composer(&text);
    };

    let title = work
        .select_first("a[href*=works]")
        .map(|a| a.text())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| match text.split_once(':') {
            Some((_, rest)) => clean(rest),
            None => text.clone(),
        });
    (Some(composer), title)
}

/// Split `Composer: Title`; without a colon there is no composer.
fn split_composer(text: &str) -> (Option<String>, String) {
    match text.split_once(':') {
        Some((composer, title)) if !composer.trim().is_empty() => {
            (Some(normalize_whitespace(composer)), normalize_whitespace(title))
        }
        _ => (None, normalize_whitespace(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partitura_core::Role;

    const PAGE: &str = r#"<html><head>
<title>Foo - Bar | Presto Music</title>
<meta property="og:title" content="Noël! Christmas! Weihnachten!">
</head><body>
<h1 class="c-product-block__title">Noel Christmas</h1>
<ul class="c-product-block__metadata">
  <li>Release date: 28th Oct 2016</li>
  <li>Label: <a href="/labels/hm">Harmonia Mundi</a></li>
  <li>Catalogue number: HMM 902000</li>
  <li>Choir: RIAS Kammerchor</li>
  <li>Conductor: Marcus Creed</li>
</ul>
<div class="c-tracklist">
  <div class="c-tracklist__work">
    <div class="c-track__title">
      <a href="/classical/composers/1-praetorius">Michael Praetorius</a>:
      <a href="/classical/works/2-in-dulci">In Dulci Jubilo</a>
    </div>
  </div>
  <div class="c-tracklist__work">
    <div class="c-track__title">Quatre Motets Pour Le Temps de Noël</div>
    <a href="/classical/composers/3-poulenc">Francis Poulenc</a>
    <div class="c-track c-track--track"><div class="c-track__title">O Magnum Mysterium</div></div>
    <div class="c-track c-track--track"><div class="c-track__title">Hodie Christus Natus Est</div></div>
  </div>
  <div class="c-tracklist__work">
    <div class="c-track__title">Gruber: Stille Nacht</div>
  </div>
  <div class="c-tracklist__work">
    <div class="c-track__title">Es ist ein Ros entsprungen</div>
  </div>
</div>
</body></html>"#;

    #[test]
    fn test_og_title_wins_verbatim() {
        let result = extract(PAGE).unwrap();
        assert_eq!(result.album().title, "Noël! Christmas! Weihnachten!");
        assert_eq!(result.source(), SOURCE);
    }

    #[test]
    fn test_title_fallbacks() {
        let page = r#"<title>Foo - Bar | Presto Music</title>"#;
        assert_eq!(extract(page).unwrap().album().title, "Foo");
        let page = r#"<title>Messiah | Presto Music</title>"#;
        assert_eq!(extract(page).unwrap().album().title, "Messiah");
        let page = r#"<h1 class="c-product-block__title">Heading</h1><title>T</title>"#;
        assert_eq!(extract(page).unwrap().album().title, "Heading");
    }

    #[test]
    fn test_metadata_fields() {
        let result = extract(PAGE).unwrap();
        let album = result.album();
        assert_eq!(album.original_year, 2016);
        assert_eq!(
            album.edition,
            Some(Edition::new("Harmonia Mundi", "HMM 902000", 2016))
        );
        assert_eq!(
            album.album_artist,
            vec![
                Artist::new("RIAS Kammerchor", Role::Ensemble),
                Artist::new("Marcus Creed", Role::Conductor),
            ]
        );
    }

    #[test]
    fn test_tracks_flat_and_hierarchical() {
        let result = extract(PAGE).unwrap();
        let tracks = &result.album().tracks;
        assert_eq!(tracks.len(), 5);
        let numbers: Vec<u32> = tracks.iter().map(|t| t.track).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert!(tracks.iter().all(|t| t.disc == 1));

        assert_eq!(tracks[0].title, "In Dulci Jubilo");
        assert_eq!(tracks[0].composer().unwrap().name, "Michael Praetorius");

        assert_eq!(
            tracks[1].title,
            "Quatre Motets Pour Le Temps de Noël: O Magnum Mysterium"
        );
        assert_eq!(tracks[2].composer().unwrap().name, "Francis Poulenc");

        assert_eq!(tracks[3].title, "Stille Nacht");
        assert_eq!(tracks[3].composer().unwrap().name, "Gruber");

        assert_eq!(tracks[4].composer().unwrap().name, ANONYMOUS);
        assert_eq!(tracks[4].title, "Es ist ein Ros entsprungen");
    }

    #[test]
    fn test_all_caps_names_are_title_cased() {
        let page = r#"<h1 class="c-product-block__title">Symphonies</h1>
<ul class="c-product-block__metadata">
  <li>Orchestra: BERLINER PHILHARMONIKER</li>
</ul>
<div class="c-tracklist__work">
  <div class="c-track__title">
    <a href="/classical/composers/4-brahms">JOHANNES BRAHMS</a>:
    <a href="/classical/works/5-sym">Symphony No. 1</a>
  </div>
</div>
<div class="c-tracklist__work">
  <div class="c-track__title">BEETHOVEN: Egmont Overture</div>
</div>"#;
        let result = extract(page).unwrap();
        let album = result.album();
        assert_eq!(album.album_artist[0].name, "Berliner Philharmoniker");
        assert_eq!(album.tracks[0].composer().unwrap().name, "Johannes Brahms");
        assert_eq!(album.tracks[1].composer().unwrap().name, "Beethoven");
    }

    #[test]
    fn test_missing_fields_are_required_errors() {
        let result = extract("<html><body></body></html>").unwrap();
        assert!(result.has_error_for("title"));
        assert!(result.has_error_for("original_year"));
        assert!(result.album().tracks.is_empty());
    }

    #[test]
    fn test_split_composer() {
        assert_eq!(
            split_composer("Bach: Mass in B minor"),
            (Some("Bach".to_string()), "Mass in B minor".to_string())
        );
        assert_eq!(split_composer("Stille Nacht"), (None, "Stille Nacht".to_string()));
    }

    #[test]
    fn test_performer_labels() {
        assert_eq!(performer_label("soloist(s)"), Some(Some("soloist")));
        assert_eq!(performer_label("performers"), Some(None));
        assert_eq!(performer_label("artists"), Some(None));
        assert_eq!(performer_label("label"), None);
    }
}
