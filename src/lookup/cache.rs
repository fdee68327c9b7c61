//! Read-through lookup cache.
//!
//! Caches successful lookups in memory to avoid repeated network requests.
//! Uses the normalized query key as the cache key, so "The Wall" and
//! "the wall!" share an entry. Failures are never cached.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{CanonicalLookup, LookupError};
use crate::engine::normalize::query_key;
use crate::model::CanonicalCandidate;

/// In-memory read-through cache in front of another lookup.
pub struct CachedLookup<L> {
    inner: L,
    entries: Mutex<HashMap<String, Vec<CanonicalCandidate>>>,
}

impl<L> CachedLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached queries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl<L: CanonicalLookup> CanonicalLookup for CachedLookup<L> {
    async fn query(
        &self,
        album_artist: &str,
        album: &str,
    ) -> Result<Vec<CanonicalCandidate>, LookupError> {
        let key = query_key(album_artist, album);

        if let Some(hit) = self.entries.lock().get(&key) {
            tracing::debug!("Lookup cache hit for {:?}", key);
            return Ok(hit.clone());
        }

        let candidates = self.inner.query(album_artist, album).await?;
        self.entries.lock().insert(key, candidates.clone());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::mocks::MockLookup;
    use crate::test_utils::mock_candidate;

    #[tokio::test]
    async fn test_second_query_is_served_from_cache() {
        let cached = CachedLookup::new(MockLookup::returning(vec![mock_candidate(5)]));

        let first = cached.query("Pink Floyd", "Animals").await.unwrap();
        let second = cached.query("pink floyd", "  Animals!").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls(), 1);
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cached = CachedLookup::new(MockLookup::with_error(LookupError::Unavailable(
            "quota exceeded".to_string(),
        )));

        assert!(cached.query("a", "b").await.is_err());
        assert!(cached.query("a", "b").await.is_err());

        assert_eq!(cached.inner.calls(), 2);
        assert!(cached.is_empty());
    }
}
