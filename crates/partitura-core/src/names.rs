//! Artist-name canonicalization and deduplication.
//!
//! Names fold to lowercase ASCII letters and digits. Digits are kept on
//! purpose so numbered ensembles (`Orchestra 1`, `Orchestra 2`) stay
//! distinct. The first spelling seen is the one that survives.

use crate::model::{Artist, Role};

/// Lowercase and drop every code point that is not an ASCII letter or digit.
///
/// A name with no ASCII alphanumerics at all (e.g. written entirely in
/// Cyrillic) folds to its trimmed lowercase form instead, so such names
/// never collapse into one empty key.
pub fn canonicalize(name: &str) -> String {
    let folded: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if folded.is_empty() {
        name.trim().to_lowercase()
    } else {
        folded
    }
}

fn merge_warning(discarded: &str, kept: &str, canonical: &str) -> String {
    format!("duplication: {discarded} merged with {kept} (normalized: {canonical})")
}

/// Collapse name variants, keeping the first spelling of each.
///
/// Returns the surviving names in first-seen order plus one warning per
/// discarded variant. Exact repeats are dropped silently.
pub fn dedup_names<S: AsRef<str>>(names: &[S]) -> (Vec<String>, Vec<String>) {
    let mut kept: Vec<(String, String)> = Vec::new();
    let mut warnings = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        let canonical = canonicalize(name);
        match kept.iter().find(|(c, _)| *c == canonical) {
            Some((_, existing)) if existing != name => {
                warnings.push(merge_warning(name, existing, &canonical));
            }
            Some(_) => {}
            None => kept.push((canonical, name.to_string())),
        }
    }
    (kept.into_iter().map(|(_, n)| n).collect(), warnings)
}

/// Collapse artists sharing a canonical name *and* a role.
///
/// The same name under two roles is preserved as two entries.
pub fn dedup_artists(artists: Vec<Artist>) -> (Vec<Artist>, Vec<String>) {
    let mut seen: Vec<(String, Role, usize)> = Vec::new();
    let mut out: Vec<Artist> = Vec::with_capacity(artists.len());
    let mut warnings = Vec::new();
    for artist in artists {
        let canonical = canonicalize(&artist.name);
        match seen
            .iter()
            .find(|(c, r, _)| *c == canonical && *r == artist.role)
        {
            Some(&(_, _, idx)) => {
                if out[idx].name != artist.name {
                    warnings.push(merge_warning(&artist.name, &out[idx].name, &canonical));
                }
            }
            None => {
                seen.push((canonical, artist.role, out.len()));
                out.push(artist);
            }
        }
    }
    (out, warnings)
}
