//! Source extractors and the extraction pipeline for partitura.
//!
//! Reads album metadata from tagged audio directories and from Presto and
//! Discogs release pages, then hands the draft to the core normalizer.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
mod draft;
pub mod error;
pub mod fetch;
pub mod html;
pub mod pipeline;
pub mod tags;

pub use config::Config;
pub use error::{ExtractError, ExtractResult};
pub use fetch::{FetchedPage, HttpFetcher};
pub use html::HtmlSource;
pub use pipeline::{Pipeline, Source};
pub use tags::{LoftyTagReader, MemoryTagReader, TagMap, TagReader};
