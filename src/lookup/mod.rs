//! Canonical metadata lookup.
//!
//! # Architecture
//!
//! The engine depends only on the [`CanonicalLookup`] trait. Everything
//! else here is a collaborator plugged in behind it:
//! - **Providers** ([`MusicBrainzLookup`]) - HTTP clients that turn a query
//!   into ranked [`CanonicalCandidate`]s
//! - **Decorators** - [`CachedLookup`] (read-through cache keyed by the
//!   normalized query key) and [`BoundedLookup`] (concurrency limit plus
//!   per-query timeout)
//!
//! A failed lookup never aborts a release: the engine logs the error and
//! carries on as if no candidate had been found.
//!
//! # Usage
//!
//! ```ignore
//! let provider = MusicBrainzLookup::new(3)?;
//! let lookup = BoundedLookup::new(CachedLookup::new(provider), 4, Duration::from_secs(20));
//! let candidates = lookup.query("Pink Floyd", "Animals").await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::model::CanonicalCandidate;

mod bounded;
mod cache;
pub mod musicbrainz;

pub use bounded::BoundedLookup;
pub use cache::CachedLookup;
pub use musicbrainz::MusicBrainzLookup;

/// Errors a canonical metadata provider can report.
///
/// All of them mean the same thing to the engine: no candidates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Resolve an album query into candidate canonical releases, best first.
#[async_trait]
pub trait CanonicalLookup: Send + Sync {
    async fn query(
        &self,
        album_artist: &str,
        album: &str,
    ) -> Result<Vec<CanonicalCandidate>, LookupError>;
}

#[async_trait]
impl<T: CanonicalLookup + ?Sized> CanonicalLookup for Arc<T> {
    async fn query(
        &self,
        album_artist: &str,
        album: &str,
    ) -> Result<Vec<CanonicalCandidate>, LookupError> {
        (**self).query(album_artist, album).await
    }
}

/// Mock lookup for testing.
///
/// Returns configurable responses and counts calls.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct MockLookup {
        /// Candidates to return
        pub candidates: Vec<CanonicalCandidate>,
        /// Error to return (takes precedence over candidates)
        pub error: Option<LookupError>,
        /// Artificial latency before answering
        pub delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockLookup {
        pub fn returning(candidates: Vec<CanonicalCandidate>) -> Self {
            Self {
                candidates,
                error: None,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn no_matches() -> Self {
            Self::returning(vec![])
        }

        pub fn with_error(error: LookupError) -> Self {
            Self {
                error: Some(error),
                ..Self::no_matches()
            }
        }

        pub fn slow(delay: Duration, candidates: Vec<CanonicalCandidate>) -> Self {
            Self {
                delay: Some(delay),
                ..Self::returning(candidates)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CanonicalLookup for MockLookup {
        async fn query(
            &self,
            _album_artist: &str,
            _album: &str,
        ) -> Result<Vec<CanonicalCandidate>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(ref err) = self.error {
                return Err(err.clone());
            }
            Ok(self.candidates.clone())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_utils::mock_candidate;

        #[tokio::test]
        async fn test_mock_lookup_returns_candidates() {
            let mock = MockLookup::returning(vec![mock_candidate(5)]);
            let results = mock.query("Pink Floyd", "Animals").await.unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(mock.calls(), 1);
        }

        #[tokio::test]
        async fn test_mock_lookup_error() {
            let mock = MockLookup::with_error(LookupError::RateLimited);
            let result = mock.query("a", "b").await;
            assert!(matches!(result, Err(LookupError::RateLimited)));
        }

        #[tokio::test]
        async fn test_arc_lookup_delegates() {
            let mock = Arc::new(MockLookup::no_matches());
            let shared: Arc<dyn CanonicalLookup> = mock.clone();
            assert!(shared.query("a", "b").await.unwrap().is_empty());
            assert_eq!(mock.calls(), 1);
        }
    }
}
