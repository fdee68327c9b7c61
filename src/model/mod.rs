//! Core data models for release reconciliation.
//!
//! Defines the primary entities: [`TagSet`], [`Track`], [`Release`] and
//! [`CanonicalCandidate`].
//!
//! # Ownership
//!
//! - A [`Track`] owns one [`TagSet`] and the path of the file it came from
//! - A [`Release`] owns its tracks; its track set is fixed once constructed
//! - Repairs mutate tag contents only, never the track set

pub(crate) mod release;
mod tags;

pub use release::{CanonicalCandidate, FileNumbers, Release, Track};
pub use tags::{Field, TagSet, TagValue};
