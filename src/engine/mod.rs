//! Reconciliation engine.
//!
//! Validates a [`Release`] against consistency rules and a canonical
//! match, plans the edits that fix what it can, and applies them.
//!
//! # Pipeline
//!
//! ```text
//! Release ──> CanonicalLookup ──> MatchResolver ──> RuleEngine ──> RepairPlanner ──> RepairApplier
//!                (optional)         (best match)     (violations)    (edits)           (files)
//! ```
//!
//! Lookup failures never abort a release: the engine logs them and runs the
//! rules that do not need a match.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::lookup::CanonicalLookup;
use crate::metadata::TagIo;
use crate::model::Release;

pub mod applier;
pub mod matcher;
pub mod normalize;
pub mod planner;
pub mod rules;

pub use applier::{ApplyError, RepairApplier, folder_name};
pub use matcher::{MatchOutcome, MatchResolver};
pub use planner::{Edit, EditSource, RepairPlan, RepairPlanner};
pub use rules::{RuleEngine, Subject, Violation, ViolationKind};

/// Tunable matching and gating thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Candidates scoring below this are never selected
    pub min_score: f64,
    /// Canonical divergence is only reported at or above this confidence
    pub detect_confidence: f64,
    /// Canonical values are only written at or above this confidence
    pub fix_confidence: f64,
    /// Titles at least this similar to the canonical title are accepted
    pub title_similarity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_score: 0.55,
            detect_confidence: 0.7,
            fix_confidence: 0.8,
            title_similarity: 0.85,
        }
    }
}

/// A threshold setting that cannot be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("{name} must be between 0 and 1, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("fix_confidence ({fix}) must not be below detect_confidence ({detect})")]
    GateOrder { detect: f64, fix: f64 },
}

impl Thresholds {
    /// Check that every threshold is a probability and the gates are ordered.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("min_score", self.min_score),
            ("detect_confidence", self.detect_confidence),
            ("fix_confidence", self.fix_confidence),
            ("title_similarity", self.title_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        if self.fix_confidence < self.detect_confidence {
            return Err(ThresholdError::GateOrder {
                detect: self.detect_confidence,
                fix: self.fix_confidence,
            });
        }
        Ok(())
    }
}

/// Result of planning repairs for one release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixOutcome {
    pub plan: RepairPlan,
    /// Canonical match the plan was computed against, if any
    pub matched: Option<MatchOutcome>,
}

impl FixOutcome {
    pub fn unresolved(&self) -> &[Violation] {
        self.plan.unresolved()
    }
}

/// Entry point tying lookup, matching, rules, planning and applying together.
///
/// Holds no per-release state; one engine can serve many releases
/// concurrently.
#[derive(Clone)]
pub struct Engine {
    thresholds: Thresholds,
    lookup: Option<Arc<dyn CanonicalLookup>>,
}

impl Engine {
    /// Engine without canonical lookup: structural, consistency and
    /// completeness rules only.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            lookup: None,
        }
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn CanonicalLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Query the lookup for the release and pick the best candidate.
    pub async fn resolve_match(&self, release: &Release) -> Option<MatchOutcome> {
        let lookup = self.lookup.as_ref()?;
        let album_artist = release.album_artist();
        let album = release.album();
        if album_artist.is_none() && album.is_none() {
            tracing::debug!("Release has no artist or album, skipping lookup");
            return None;
        }
        let album_artist = album_artist.unwrap_or_default();
        let album = album.unwrap_or_default();

        let candidates = match lookup.query(&album_artist, &album).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Lookup for {:?} / {:?} failed, continuing unmatched: {}", album_artist, album, e);
                return None;
            }
        };

        let outcome = MatchResolver::new(self.thresholds.min_score).resolve(release, &candidates);
        match &outcome {
            Some(m) => tracing::debug!(
                "Matched {:?} / {:?} with confidence {:.2}",
                m.candidate.album_artist,
                m.candidate.album,
                m.confidence
            ),
            None => tracing::debug!("No candidate for {:?} / {:?}", album_artist, album),
        }
        outcome
    }

    /// Violations for a release, using the canonical lookup when configured.
    pub async fn validate(&self, release: &Release) -> Vec<Violation> {
        let matched = self.resolve_match(release).await;
        self.validate_against(release, matched.as_ref())
    }

    /// Violations for a release against an already resolved match.
    pub fn validate_against(&self, release: &Release, matched: Option<&MatchOutcome>) -> Vec<Violation> {
        RuleEngine::new(self.thresholds).validate(release, matched)
    }

    /// Plan repairs for a release. Unresolved violations travel with the plan.
    pub async fn fix(&self, release: &Release) -> FixOutcome {
        let matched = self.resolve_match(release).await;
        self.fix_against(release, matched)
    }

    /// Plan repairs against an already resolved match.
    pub fn fix_against(&self, release: &Release, matched: Option<MatchOutcome>) -> FixOutcome {
        let violations = self.validate_against(release, matched.as_ref());
        let plan = RepairPlanner::new(self.thresholds.fix_confidence).plan(release, &violations);
        for violation in plan.unresolved() {
            tracing::warn!("Unresolved: {}", violation);
        }
        FixOutcome { plan, matched }
    }

    /// Commit a plan to memory and to the release's files.
    pub fn apply(&self, release: &Release, plan: RepairPlan, io: &dyn TagIo) -> Result<Release, ApplyError> {
        RepairApplier::new(io).apply(release, plan)
    }

    /// Canonical folder name for the release's current tags.
    pub fn folder_name(&self, release: &Release) -> String {
        folder_name(release)
    }

    /// Whether `dir` is already named after the release.
    pub fn folder_name_matches(&self, release: &Release, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == folder_name(release))
    }
}
