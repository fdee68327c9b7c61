//! Fuzzy matching of a local release against canonical candidates.

use serde::Serialize;

use super::normalize::similarity;
use crate::model::{CanonicalCandidate, Release};

const ARTIST_WEIGHT: f64 = 0.4;
const ALBUM_WEIGHT: f64 = 0.4;
const TRACK_COUNT_WEIGHT: f64 = 0.2;

/// The selected candidate and how well it matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub candidate: CanonicalCandidate,
    /// Match score of the candidate, `0.0..=1.0`
    pub confidence: f64,
}

/// Picks the best canonical candidate for a release.
#[derive(Debug, Clone, Copy)]
pub struct MatchResolver {
    min_score: f64,
}

impl MatchResolver {
    /// Resolver discarding candidates scoring below `min_score`.
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }

    /// Select the highest scoring candidate at or above the floor.
    ///
    /// Candidates are assumed best-first; equal scores keep the earlier one.
    pub fn resolve(
        &self,
        release: &Release,
        candidates: &[CanonicalCandidate],
    ) -> Option<MatchOutcome> {
        let artist = release.album_artist().unwrap_or_default();
        let album = release.album().unwrap_or_default();

        let mut best: Option<(&CanonicalCandidate, f64)> = None;
        for candidate in candidates {
            let score = score(&artist, &album, release.len(), candidate);
            tracing::trace!(
                "Candidate {:?} / {:?} scored {:.3}",
                candidate.album_artist,
                candidate.album,
                score
            );
            if score < self.min_score {
                continue;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }

        best.map(|(candidate, confidence)| MatchOutcome {
            candidate: candidate.clone(),
            confidence,
        })
    }
}

/// Weighted similarity between local release aggregates and a candidate.
pub fn score(
    album_artist: &str,
    album: &str,
    track_count: usize,
    candidate: &CanonicalCandidate,
) -> f64 {
    ARTIST_WEIGHT * similarity(album_artist, &candidate.album_artist)
        + ALBUM_WEIGHT * similarity(album, &candidate.album)
        + TRACK_COUNT_WEIGHT * track_count_ratio(track_count, candidate.track_titles.len())
}

/// 1.0 when counts agree, otherwise `1 - |diff| / max`, never below 0.
fn track_count_ratio(local: usize, canonical: usize) -> f64 {
    if local == canonical {
        return 1.0;
    }
    let diff = local.abs_diff(canonical) as f64;
    let max = local.max(canonical) as f64;
    (1.0 - diff / max).max(0.0)
}
