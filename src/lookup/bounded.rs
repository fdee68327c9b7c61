//! Concurrency limit and timeout around a lookup provider.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::{CanonicalLookup, LookupError};
use crate::model::CanonicalCandidate;

/// Lookup wrapper that bounds in-flight queries and times each one out.
///
/// Callers waiting for a permit are not subject to the timeout; only the
/// provider call itself is. Dropping the returned future cancels the query.
pub struct BoundedLookup<L> {
    inner: L,
    permits: Semaphore,
    timeout: Duration,
}

impl<L> BoundedLookup<L> {
    pub fn new(inner: L, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_concurrent.max(1)),
            timeout,
        }
    }
}

#[async_trait]
impl<L: CanonicalLookup> CanonicalLookup for BoundedLookup<L> {
    async fn query(
        &self,
        album_artist: &str,
        album: &str,
    ) -> Result<Vec<CanonicalCandidate>, LookupError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LookupError::Unavailable("lookup pool closed".to_string()))?;

        match tokio::time::timeout(self.timeout, self.inner.query(album_artist, album)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::mocks::MockLookup;
    use crate::test_utils::mock_candidate;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let bounded = BoundedLookup::new(
            MockLookup::slow(Duration::from_millis(500), vec![mock_candidate(5)]),
            2,
            Duration::from_millis(20),
        );

        let result = bounded.query("Pink Floyd", "Animals").await;
        assert!(matches!(result, Err(LookupError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fast_lookup_passes_through() {
        let bounded = BoundedLookup::new(
            MockLookup::returning(vec![mock_candidate(5)]),
            1,
            Duration::from_secs(5),
        );
        assert_eq!(bounded.query("a", "b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_queries_all_complete() {
        let bounded = Arc::new(BoundedLookup::new(
            MockLookup::slow(Duration::from_millis(10), vec![]),
            2,
            Duration::from_secs(5),
        ));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let bounded = bounded.clone();
                tokio::spawn(async move { bounded.query("a", "b").await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(bounded.inner.calls(), 6);
    }

    #[test]
    fn test_zero_permits_is_clamped() {
        let bounded = BoundedLookup::new(MockLookup::no_matches(), 0, Duration::from_secs(1));
        assert_eq!(bounded.permits.available_permits(), 1);
    }
}
