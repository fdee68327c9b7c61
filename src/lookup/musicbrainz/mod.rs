//! MusicBrainz canonical lookup
//!
//! Searches releases by album artist and title, then fetches the track
//! listing of the best-scored hits.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod adapter;
mod client;

pub use adapter::to_candidate;
pub use client::{DEFAULT_BASE_URL, MusicBrainzLookup};
