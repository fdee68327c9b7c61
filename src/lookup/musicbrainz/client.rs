//! MusicBrainz HTTP client
//!
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{adapter, dto};
use crate::lookup::{CanonicalLookup, LookupError};
use crate::model::CanonicalCandidate;

pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// User agent string - MusicBrainz requires this
const USER_AGENT: &str = concat!(
    "ReleaseMender/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/release-mender)"
);

/// Minimum spacing between requests
const MIN_INTERVAL: Duration = Duration::from_millis(1100);

/// Release search against the MusicBrainz web service.
pub struct MusicBrainzLookup {
    http_client: reqwest::Client,
    base_url: String,
    max_candidates: usize,
    last_request: Mutex<Option<Instant>>,
}

impl MusicBrainzLookup {
    /// Create a client against the public MusicBrainz server
    pub fn new(max_candidates: usize) -> Result<Self, LookupError> {
        Self::with_base_url(DEFAULT_BASE_URL, max_candidates)
    }

    /// Create a client against a mirror or test server
    pub fn with_base_url(
        base_url: impl Into<String>,
        max_candidates: usize,
    ) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("HTTP client: {}", e)))?;

        let base_url: String = base_url.into();
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_candidates: max_candidates.max(1),
            last_request: Mutex::new(None),
        })
    }

    fn search_url(&self, album_artist: &str, album: &str) -> String {
        let query = format!(
            "release:\"{}\" AND artist:\"{}\"",
            lucene_phrase(album),
            lucene_phrase(album_artist)
        );
        format!(
            "{}/release?query={}&fmt=json&limit={}",
            self.base_url,
            urlencoding::encode(&query),
            self.max_candidates
        )
    }

    fn release_url(&self, id: &str) -> String {
        format!(
            "{}/release/{}?inc=recordings+artist-credits&fmt=json",
            self.base_url,
            urlencoding::encode(id)
        )
    }

    /// Wait until at least [`MIN_INTERVAL`] has passed since the last request
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < MIN_INTERVAL {
                tokio::time::sleep(MIN_INTERVAL - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Send a GET request and parse the JSON response
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, LookupError> {
        self.throttle().await;
        tracing::debug!("MusicBrainz request: {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            return Err(LookupError::RateLimited);
        }

        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(LookupError::Unavailable(error.error));
            }
            return Err(LookupError::Unavailable(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CanonicalLookup for MusicBrainzLookup {
    async fn query(
        &self,
        album_artist: &str,
        album: &str,
    ) -> Result<Vec<CanonicalCandidate>, LookupError> {
        let search: dto::SearchResponse = self.get_json(&self.search_url(album_artist, album)).await?;

        let mut candidates = Vec::new();
        for hit in search.releases.into_iter().take(self.max_candidates) {
            let release: dto::Release = self.get_json(&self.release_url(&hit.id)).await?;
            candidates.push(adapter::to_candidate(release));
        }

        tracing::debug!(
            "MusicBrainz returned {} candidates for {:?} / {:?}",
            candidates.len(),
            album_artist,
            album
        );
        Ok(candidates)
    }
}

/// Escape a value for use inside a quoted Lucene phrase
fn lucene_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
