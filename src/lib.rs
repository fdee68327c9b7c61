//! Release Mender - validate and repair audio release metadata.
//!
//! A release is a directory of tracks presumed to form one album. The
//! [`engine`] checks its tags for consistency, compares them with a
//! canonical release from a [`lookup`] provider, plans the edits it can
//! make safely and writes them back through the [`metadata`] layer.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod lookup;
pub mod metadata;
pub mod model;
pub mod organizer;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;
