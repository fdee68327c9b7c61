//! Crate-wide error types.
//!
//! This module provides a unified error hierarchy for the crate.
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum
//! - Module-specific errors ([`TagReadError`],
//!   [`LookupError`](crate::lookup::LookupError),
//!   [`ApplyError`](crate::engine::ApplyError)) for detailed handling
//! - Unresolved violations are not errors; they are returned next to a repair
//!   plan (see [`crate::engine::FixOutcome`])
//!
//! # Example
//!
//! ```ignore
//! use release_mender::error::{Result, ResultExt};
//!
//! fn load(dir: &Path) -> Result<LoadedRelease> {
//!     library::load_release(dir, &io, &extensions).with_context("loading release")
//! }
//! ```

use std::path::PathBuf;

pub use crate::metadata::TagReadError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A track's tags could not be read
    #[error(transparent)]
    TagRead(#[from] TagReadError),

    /// No readable track in a release directory
    #[error("No readable tracks in {0}")]
    EmptyRelease(PathBuf),

    /// File organization error
    #[error("Organization error: {0}")]
    Organization(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an empty release error.
    pub fn empty_release(path: impl Into<PathBuf>) -> Self {
        Self::EmptyRelease(path.into())
    }

    /// Create an organization error.
    pub fn organization(message: impl Into<String>) -> Self {
        Self::Organization(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
