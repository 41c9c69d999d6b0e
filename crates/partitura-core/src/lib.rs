//! Core domain model for partitura.
//!
//! This crate defines the canonical album record (Album, Track, Edition,
//! Artist), the text and name helpers every source extractor leans on,
//! the album normalizer, the immutable extraction result, and the
//! canonical JSON codec shared by all producers and consumers.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod codec;
pub mod error;
pub mod model;
pub mod names;
pub mod normalize;
pub mod result;
pub mod roles;
pub mod structure;
pub mod text;

pub use error::{Error, Result};
pub use model::{Album, Artist, Edition, Role, Track, TrackFile};
pub use normalize::normalize;
pub use result::{ExtractionResult, FieldError, Stage};
