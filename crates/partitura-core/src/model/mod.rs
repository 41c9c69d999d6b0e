pub mod album;
pub mod artist;

pub use album::{Album, Edition, Track, TrackFile, MISSING_TITLE, UNKNOWN_LABEL, VARIOUS_ARTISTS};
pub use artist::{Artist, Role};
