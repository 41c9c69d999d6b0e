//! Album extraction from retailer and catalogue HTML pages.

pub mod discogs;
pub mod markup;
pub mod presto;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ExtractError, ExtractResult};

#[allow(clippy::unwrap_used)]
static YEAR_IN_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

/// The page layouts we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlSource {
    Presto,
    Discogs,
}

impl HtmlSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presto => presto::SOURCE,
            Self::Discogs => discogs::SOURCE,
        }
    }
}

impl fmt::Display for HtmlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HtmlSource {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "presto" => Ok(Self::Presto),
            "discogs" => Ok(Self::Discogs),
            other => Err(ExtractError::parse("html", format!("unknown page source: {other}"))),
        }
    }
}

/// Guess the layout from marker strings in the page.
pub fn detect(body: &str) -> ExtractResult<HtmlSource> {
    if body.contains("release_schema") || body.contains("tracklist_ZdQ0I") {
        Ok(HtmlSource::Discogs)
    } else if body.contains("c-tracklist__work") || body.contains("Presto Music") {
        Ok(HtmlSource::Presto)
    } else {
        Err(ExtractError::parse(
            "html",
            "page is neither a Presto nor a Discogs release page",
        ))
    }
}

/// First year between 1900 and 2099 appearing in `text`.
pub(crate) fn first_year(text: &str) -> Option<u32> {
    YEAR_IN_RANGE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}
