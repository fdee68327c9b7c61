//! Consistency and completeness rules.
//!
//! Violations are emitted in a fixed order so that planning is
//! deterministic:
//! 1. Track numbering (missing, duplicate, then out-of-range numbers)
//! 2. Disc numbering (missing disc numbers, then gaps in the disc sequence)
//! 3. Declared totals (total tracks, then total discs)
//! 4. Release-level fields in enumeration order (album artist, album, year),
//!    each checked for consistency and then against the canonical match
//! 5. Per track in track order: canonical title, required fields, then
//!    surrounding whitespace

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::Thresholds;
use super::matcher::MatchOutcome;
use super::normalize::similarity;
use crate::model::release::{mode, present};
use crate::model::{Field, Release, TagValue, Track};

/// Release-level fields that every track should agree on.
pub const ALBUM_FIELDS: [Field; 3] = [Field::AlbumArtist, Field::Album, Field::Year];

/// Fields every track must carry.
pub const REQUIRED_FIELDS: [Field; 3] = [Field::Title, Field::Artist, Field::Album];

/// Text fields checked for leading or trailing whitespace.
pub const TRIMMED_FIELDS: [Field; 5] = [
    Field::Title,
    Field::Artist,
    Field::AlbumArtist,
    Field::Album,
    Field::Genre,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingTrackNumber,
    DuplicateTrackNumber,
    TrackNumberOutOfRange,
    MissingDiscNumber,
    DiscNumberGap,
    InconsistentTotalTracks,
    InconsistentTotalDiscs,
    InconsistentAlbumField,
    TitleDivergesFromCanonical,
    FieldDivergesFromCanonical,
    MissingRequiredField,
    SurroundingWhitespace,
}

impl ViolationKind {
    /// Whether fixing this needs a confident canonical match.
    pub fn is_canonical(self) -> bool {
        matches!(
            self,
            Self::TitleDivergesFromCanonical
                | Self::FieldDivergesFromCanonical
                | Self::MissingRequiredField
        )
    }
}

/// What a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// Track numbering of the release as a whole
    Structural,
    Field(Field),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Structural => f.write_str("structural"),
            Subject::Field(field) => write!(f, "{}", field),
        }
    }
}

/// A detected metadata problem.
///
/// Carries the expected value when one is known, so the planner never has
/// to re-derive it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub subject: Subject,
    /// Index into the release's track order
    pub track: Option<usize>,
    pub kind: ViolationKind,
    pub detail: String,
    pub expected: Option<TagValue>,
    pub actual: Option<TagValue>,
    /// Confidence of the canonical match the violation was derived from
    pub confidence: Option<f64>,
}

impl Violation {
    fn new(subject: Subject, track: Option<usize>, kind: ViolationKind, detail: String) -> Self {
        Self {
            subject,
            track,
            kind,
            detail,
            expected: None,
            actual: None,
            confidence: None,
        }
    }

    fn values(mut self, expected: Option<TagValue>, actual: Option<TagValue>) -> Self {
        self.expected = expected;
        self.actual = actual;
        self
    }

    fn from_match(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// The field an edit for this violation would touch.
    pub fn field(&self) -> Field {
        match self.subject {
            Subject::Structural => Field::TrackNumber,
            Subject::Field(field) => field,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.track {
            Some(i) => write!(f, "[{}] track {}: {}", self.subject, i + 1, self.detail),
            None => write!(f, "[{}] {}", self.subject, self.detail),
        }
    }
}

/// Evaluates the fixed rule set against a release.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine {
    thresholds: Thresholds,
}

impl RuleEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Run every rule and return violations in emission order.
    ///
    /// Canonical divergence rules only run when `matched` reaches the
    /// detection threshold. All other rules always run.
    pub fn validate(&self, release: &Release, matched: Option<&MatchOutcome>) -> Vec<Violation> {
        let mut out = Vec::new();
        let detected = matched.filter(|m| m.confidence >= self.thresholds.detect_confidence);

        let renumbering = structural(release, &mut out);
        disc_numbers(release, &mut out);
        total_tracks(release, renumbering, &mut out);
        total_discs(release, &mut out);
        for field in ALBUM_FIELDS {
            consistency(release, field, detected, &mut out);
            if let Some(m) = detected {
                field_divergence(release, field, m, &mut out);
            }
        }
        for index in 0..release.len() {
            if let Some(m) = detected {
                title_divergence(release, index, m, self.thresholds.title_similarity, &mut out);
            }
            completeness(release, index, matched, &mut out);
            whitespace(release, index, &mut out);
        }

        out
    }
}

/// Track numbering rules. Returns whether the release needs renumbering.
fn structural(release: &Release, out: &mut Vec<Violation>) -> bool {
    let tracks = release.tracks();
    let mut renumbering = false;

    if tracks.len() > 1 {
        for (i, track) in tracks.iter().enumerate() {
            if track.track_number().is_some() {
                continue;
            }
            let suggested = track.file_numbers().track;
            let detail = match suggested {
                Some(n) => format!("track number is missing (file name suggests {})", n),
                None => "track number is missing".to_string(),
            };
            out.push(
                Violation::new(Subject::Structural, Some(i), ViolationKind::MissingTrackNumber, detail)
                    .values(suggested.map(TagValue::Number), None),
            );
            renumbering = true;
        }
    }

    let mut seen: HashMap<(u32, u32), usize> = HashMap::new();
    for track in tracks {
        if let Some(n) = track.track_number() {
            *seen.entry((track.disc(), n)).or_default() += 1;
        }
    }
    for (i, track) in tracks.iter().enumerate() {
        if let Some(n) = track.track_number()
            && seen.get(&(track.disc(), n)).copied().unwrap_or(0) > 1
        {
            out.push(
                Violation::new(
                    Subject::Structural,
                    Some(i),
                    ViolationKind::DuplicateTrackNumber,
                    format!("track number {} is used more than once on disc {}", n, track.disc()),
                )
                .values(None, Some(TagValue::Number(n))),
            );
            renumbering = true;
        }
    }

    for (i, track) in tracks.iter().enumerate() {
        if let (Some(n), Some(total)) = (track.track_number(), track.tags().number(Field::TotalTracks))
            && n > total
        {
            out.push(
                Violation::new(
                    Subject::Structural,
                    Some(i),
                    ViolationKind::TrackNumberOutOfRange,
                    format!("track number {} exceeds declared total of {}", n, total),
                )
                .values(None, Some(TagValue::Number(n))),
            );
        }
    }

    renumbering
}

/// Flag untagged discs once any track carries a disc number, then gaps in
/// the disc sequence.
fn disc_numbers(release: &Release, out: &mut Vec<Violation>) {
    let tracks = release.tracks();
    let declared: BTreeSet<u32> = tracks
        .iter()
        .filter_map(|t| t.tags().number(Field::DiscNumber))
        .collect();
    let discs: BTreeSet<u32> = tracks.iter().map(Track::disc).collect();

    if !declared.is_empty() || discs.len() > 1 {
        let single_disc = declared.iter().all(|&d| d == 1);
        for (i, track) in tracks.iter().enumerate() {
            if track.tags().number(Field::DiscNumber).is_some() {
                continue;
            }
            let expected = track.file_numbers().disc.or(single_disc.then_some(1));
            out.push(
                Violation::new(
                    Subject::Field(Field::DiscNumber),
                    Some(i),
                    ViolationKind::MissingDiscNumber,
                    "disc number is missing".to_string(),
                )
                .values(expected.map(TagValue::Number), None),
            );
        }
    }

    if !discs.is_empty() && !is_sequence(&discs) {
        let list: Vec<String> = discs.iter().map(u32::to_string).collect();
        out.push(Violation::new(
            Subject::Field(Field::DiscNumber),
            None,
            ViolationKind::DiscNumberGap,
            format!("discs {} are not numbered from 1 without gaps", list.join(", ")),
        ));
    }
}

/// Declared track totals must match the number of tracks on each disc.
///
/// Only discs where some track declares a total are checked. A missing
/// total is expected to be the disc's track count once numbering is (or
/// will be made) complete; a declared total is never second-guessed.
fn total_tracks(release: &Release, renumbering: bool, out: &mut Vec<Violation>) {
    let tracks = release.tracks();
    let mut by_disc: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, track) in tracks.iter().enumerate() {
        by_disc.entry(track.disc()).or_default().push(i);
    }

    for (disc, indices) in by_disc {
        let totals: Vec<Option<u32>> = indices
            .iter()
            .map(|&i| tracks[i].tags().number(Field::TotalTracks))
            .collect();
        if totals.iter().all(Option::is_none) {
            continue;
        }

        let count = indices.len() as u32;
        let numbers: BTreeSet<u32> = indices.iter().filter_map(|&i| tracks[i].track_number()).collect();
        let complete = renumbering || (numbers.len() == indices.len() && is_sequence(&numbers));

        for (&i, total) in indices.iter().zip(totals) {
            if total == Some(count) {
                continue;
            }
            let detail = match total {
                Some(t) => format!("total tracks {} does not match {} tracks on disc {}", t, count, disc),
                None => format!("total tracks is missing ({} tracks on disc {})", count, disc),
            };
            let expected = (total.is_none() && complete).then_some(TagValue::Number(count));
            out.push(
                Violation::new(
                    Subject::Field(Field::TotalTracks),
                    Some(i),
                    ViolationKind::InconsistentTotalTracks,
                    detail,
                )
                .values(expected, total.map(TagValue::Number)),
            );
        }
    }
}

/// Declared disc totals must match the highest disc. Checked on
/// multi-disc releases and wherever a track declares a total.
fn total_discs(release: &Release, out: &mut Vec<Violation>) {
    let tracks = release.tracks();
    let discs: BTreeSet<u32> = tracks.iter().map(Track::disc).collect();
    let Some(&last) = discs.last() else {
        return;
    };
    let declared = tracks.iter().any(|t| t.tags().number(Field::TotalDiscs).is_some());
    if !declared && discs.len() < 2 {
        return;
    }

    let contiguous = is_sequence(&discs);
    for (i, track) in tracks.iter().enumerate() {
        let total = track.tags().number(Field::TotalDiscs);
        if total == Some(last) {
            continue;
        }
        let detail = match total {
            Some(t) => format!("total discs {} does not match last disc {}", t, last),
            None => format!("total discs is missing (last disc is {})", last),
        };
        let expected = (total.is_none() && contiguous).then_some(TagValue::Number(last));
        out.push(
            Violation::new(
                Subject::Field(Field::TotalDiscs),
                Some(i),
                ViolationKind::InconsistentTotalDiscs,
                detail,
            )
            .values(expected, total.map(TagValue::Number)),
        );
    }
}

/// Whether a set of numbers is exactly `1..=len`.
fn is_sequence(numbers: &BTreeSet<u32>) -> bool {
    numbers.iter().copied().eq(1..=numbers.len() as u32)
}

/// Flag tracks that disagree with the most common value of a field.
///
/// Absent values never form the mode but are flagged once any track has a
/// value. A track already holding the confidently matched canonical value is
/// left to the canonical rule.
fn consistency(
    release: &Release,
    field: Field,
    matched: Option<&MatchOutcome>,
    out: &mut Vec<Violation>,
) {
    let values = release.values(field);
    let Some(top) = mode(values.iter().flatten()) else {
        return;
    };
    if top.count == values.len() {
        return;
    }

    let canonical = matched.and_then(|m| m.candidate.album_value(field));
    let expected = top.unique.then(|| top.value.clone());

    for (i, value) in values.iter().enumerate() {
        if value.as_ref() == Some(top.value) {
            continue;
        }
        if canonical.is_some() && *value == canonical {
            continue;
        }
        let detail = match &expected {
            Some(v) => format!("{} disagrees with {} of {} tracks ({})", field, top.count, values.len(), v),
            None => format!("{} has no majority value across tracks", field),
        };
        out.push(
            Violation::new(Subject::Field(field), Some(i), ViolationKind::InconsistentAlbumField, detail)
                .values(expected.clone(), value.clone()),
        );
    }
}

fn field_divergence(release: &Release, field: Field, matched: &MatchOutcome, out: &mut Vec<Violation>) {
    let Some(canonical) = matched.candidate.album_value(field) else {
        return;
    };
    for (i, value) in release.values(field).into_iter().enumerate() {
        if value.as_ref() == Some(&canonical) {
            continue;
        }
        out.push(
            Violation::new(
                Subject::Field(field),
                Some(i),
                ViolationKind::FieldDivergesFromCanonical,
                format!("{} differs from canonical {:?}", field, canonical.to_string()),
            )
            .values(Some(canonical.clone()), value)
            .from_match(matched.confidence),
        );
    }
}

fn title_divergence(
    release: &Release,
    index: usize,
    matched: &MatchOutcome,
    threshold: f64,
    out: &mut Vec<Violation>,
) {
    let Some(track) = release.track(index) else {
        return;
    };
    let (Some(local), Some(canonical)) = (track.tags().text(Field::Title), matched.candidate.title_at(index))
    else {
        return;
    };
    let sim = similarity(local, canonical);
    if sim < threshold {
        out.push(
            Violation::new(
                Subject::Field(Field::Title),
                Some(index),
                ViolationKind::TitleDivergesFromCanonical,
                format!("title {:?} differs from canonical {:?} (similarity {:.2})", local, canonical, sim),
            )
            .values(Some(canonical.into()), Some(local.into()))
            .from_match(matched.confidence),
        );
    }
}

fn completeness(release: &Release, index: usize, matched: Option<&MatchOutcome>, out: &mut Vec<Violation>) {
    let Some(track) = release.track(index) else {
        return;
    };
    for field in REQUIRED_FIELDS {
        if present(track.tags(), field).is_some() {
            continue;
        }
        let mut violation = Violation::new(
            Subject::Field(field),
            Some(index),
            ViolationKind::MissingRequiredField,
            format!("{} is missing", field),
        );
        if let Some(m) = matched {
            violation = violation
                .values(canonical_value(m, field, index), None)
                .from_match(m.confidence);
        }
        out.push(violation);
    }
}

/// Canonical value of a required field for the track at `index`.
fn canonical_value(matched: &MatchOutcome, field: Field, index: usize) -> Option<TagValue> {
    match field {
        Field::Title => matched.candidate.title_at(index).map(TagValue::from),
        // Candidates carry no per-track artists
        Field::Artist => None,
        other => matched.candidate.album_value(other),
    }
}

/// Leading or trailing whitespace in text fields. Blank values are left to
/// the completeness rule.
fn whitespace(release: &Release, index: usize, out: &mut Vec<Violation>) {
    let Some(track) = release.track(index) else {
        return;
    };
    for field in TRIMMED_FIELDS {
        let Some(TagValue::Text(raw)) = track.tags().get(field) else {
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() == raw.len() {
            continue;
        }
        out.push(
            Violation::new(
                Subject::Field(field),
                Some(index),
                ViolationKind::SurroundingWhitespace,
                format!("{} has leading or trailing whitespace", field),
            )
            .values(Some(trimmed.into()), Some(raw.as_str().into())),
        );
    }
}
