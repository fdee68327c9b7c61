//! Turning violations into a conflict-free set of field edits.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::rules::{Violation, ViolationKind};
use crate::model::{Field, Release, TagValue};

/// Where an edit's target value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EditSource {
    /// The release's own tracks: a majority value, a count, or a number
    /// read from a file name
    #[serde(rename = "derived")]
    Derived,
    /// The matched canonical release
    #[serde(rename = "canonical")]
    Canonical,
    /// Sequential renumbering
    #[serde(rename = "structural-fix")]
    StructuralFix,
}

impl fmt::Display for EditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EditSource::Derived => "derived",
            EditSource::Canonical => "canonical",
            EditSource::StructuralFix => "structural-fix",
        })
    }
}

/// Set one field of one track to an absolute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edit {
    pub track: usize,
    pub field: Field,
    pub old: Option<TagValue>,
    pub new: TagValue,
    pub source: EditSource,
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old.as_ref().map(ToString::to_string).unwrap_or_default();
        write!(
            f,
            "track {} {}: {:?} -> {:?} ({})",
            self.track + 1,
            self.field,
            old,
            self.new.to_string(),
            self.source
        )
    }
}

/// Ordered edits plus the violations no edit addresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairPlan {
    edits: Vec<Edit>,
    unresolved: Vec<Violation>,
}

impl RepairPlan {
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Violations left for a human or a better match to settle.
    pub fn unresolved(&self) -> &[Violation] {
        &self.unresolved
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_edits(edits: Vec<Edit>) -> Self {
        Self {
            edits,
            unresolved: Vec::new(),
        }
    }
}

/// Plans edits for violations in the order they were emitted.
///
/// At most one edit per (track, field). When two violations want different
/// values for the same field the earlier one keeps its edit and the later
/// one is reported unresolved.
#[derive(Debug, Clone, Copy)]
pub struct RepairPlanner {
    fix_confidence: f64,
}

impl RepairPlanner {
    /// Planner that only applies canonical values matched at `fix_confidence` or better.
    pub fn new(fix_confidence: f64) -> Self {
        Self { fix_confidence }
    }

    pub fn plan(&self, release: &Release, violations: &[Violation]) -> RepairPlan {
        let mut builder = Builder::new(release);
        let mut renumbered: Option<Vec<u32>> = None;

        for violation in violations {
            let resolved = match violation.kind {
                ViolationKind::MissingTrackNumber | ViolationKind::DuplicateTrackNumber => {
                    match renumbered {
                        // Already covered by the first renumbering
                        Some(_) => true,
                        None => {
                            let numbers = match numbers_from_file_names(release) {
                                Some(numbers) => {
                                    builder.renumber(&numbers, EditSource::Derived);
                                    numbers
                                }
                                None => {
                                    let numbers = renumber(release);
                                    builder.renumber(&numbers, EditSource::StructuralFix);
                                    numbers
                                }
                            };
                            renumbered = Some(numbers);
                            true
                        }
                    }
                }
                ViolationKind::TrackNumberOutOfRange => {
                    within_declared_total(release, violation, renumbered.as_deref())
                }
                ViolationKind::InconsistentAlbumField
                | ViolationKind::MissingDiscNumber
                | ViolationKind::InconsistentTotalTracks
                | ViolationKind::InconsistentTotalDiscs => match &violation.expected {
                    Some(value) => builder.propose(violation, value, EditSource::Derived),
                    None => false,
                },
                ViolationKind::SurroundingWhitespace => builder.trim(violation),
                kind if kind.is_canonical() => {
                    let confident = violation
                        .confidence
                        .is_some_and(|c| c >= self.fix_confidence);
                    match &violation.expected {
                        Some(value) if confident => {
                            builder.propose(violation, value, EditSource::Canonical)
                        }
                        _ => false,
                    }
                }
                _ => false,
            };

            if !resolved {
                tracing::debug!("Unresolved: {}", violation);
                builder.unresolved.push(violation.clone());
            }
        }

        RepairPlan {
            edits: builder.edits,
            unresolved: builder.unresolved,
        }
    }
}

struct Builder<'a> {
    release: &'a Release,
    edits: Vec<Edit>,
    unresolved: Vec<Violation>,
    claimed: HashMap<(usize, Field), TagValue>,
}

impl<'a> Builder<'a> {
    fn new(release: &'a Release) -> Self {
        Self {
            release,
            edits: Vec::new(),
            unresolved: Vec::new(),
            claimed: HashMap::new(),
        }
    }

    fn renumber(&mut self, numbers: &[u32], source: EditSource) {
        for (track, &number) in numbers.iter().enumerate() {
            self.claim(track, Field::TrackNumber, TagValue::Number(number), source);
        }
    }

    /// Trim a text field unless an earlier edit already writes a clean
    /// value to it.
    fn trim(&mut self, violation: &Violation) -> bool {
        let (Some(track), Some(value)) = (violation.track, &violation.expected) else {
            return false;
        };
        match self.claimed.get(&(track, violation.field())) {
            Some(TagValue::Text(claimed)) => claimed.trim() == claimed.as_str(),
            Some(TagValue::Number(_)) => true,
            None => self.propose(violation, value, EditSource::Derived),
        }
    }

    /// Plan an edit for a violation. Returns whether the violation is covered.
    fn propose(&mut self, violation: &Violation, value: &TagValue, source: EditSource) -> bool {
        let Some(track) = violation.track else {
            return false;
        };
        let field = violation.field();
        if !value.fits(field) || track >= self.release.len() {
            return false;
        }
        if let Some(existing) = self.claimed.get(&(track, field)) {
            // Same target from two rules is one edit, not a conflict
            return existing == value;
        }
        self.claim(track, field, value.clone(), source);
        true
    }

    fn claim(&mut self, track: usize, field: Field, value: TagValue, source: EditSource) {
        // Raw value, so trimming still counts as a change
        let old = self
            .release
            .track(track)
            .and_then(|t| t.tags().get(field))
            .filter(|v| v.as_text().is_none_or(|s| !s.trim().is_empty()))
            .cloned();
        self.claimed.insert((track, field), value.clone());
        if old.as_ref() == Some(&value) {
            return;
        }
        self.edits.push(Edit {
            track,
            field,
            old,
            new: value,
            source,
        });
    }
}

/// Sequential 1-based numbers per disc, following current track order.
fn renumber(release: &Release) -> Vec<u32> {
    let mut next: HashMap<u32, u32> = HashMap::new();
    release
        .tracks()
        .iter()
        .map(|t| {
            let n = next.entry(t.disc()).or_insert(0);
            *n += 1;
            *n
        })
        .collect()
}

/// Track numbers with the missing ones read from file names, if that leaves
/// every disc numbered exactly `1..=n`.
fn numbers_from_file_names(release: &Release) -> Option<Vec<u32>> {
    let numbers = release
        .tracks()
        .iter()
        .map(|t| t.track_number().or(t.file_numbers().track))
        .collect::<Option<Vec<u32>>>()?;

    let mut discs: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (track, &n) in release.tracks().iter().zip(&numbers) {
        discs.entry(track.disc()).or_default().push(n);
    }
    for disc in discs.values_mut() {
        disc.sort_unstable();
        if !disc.iter().copied().eq(1..=disc.len() as u32) {
            return None;
        }
    }
    Some(numbers)
}

/// An out-of-range track is fixed only if renumbering brings it within its
/// declared total.
fn within_declared_total(release: &Release, violation: &Violation, renumbered: Option<&[u32]>) -> bool {
    let (Some(index), Some(numbers)) = (violation.track, renumbered) else {
        return false;
    };
    let total = release
        .track(index)
        .and_then(|t| t.tags().number(Field::TotalTracks));
    match (numbers.get(index), total) {
        (Some(&n), Some(total)) => n <= total,
        _ => false,
    }
}
