//! Tracks, releases and canonical candidates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::tags::{Field, TagSet, TagValue};

/// One audio file and its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    path: PathBuf,
    tags: TagSet,
}

impl Track {
    pub fn new(path: impl Into<PathBuf>, tags: TagSet) -> Self {
        Self {
            path: path.into(),
            tags,
        }
    }

    /// Path of the backing file. Never changes after load.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Disc this track sits on: the tagged disc, else the one encoded in
    /// the file name, else disc 1.
    pub fn disc(&self) -> u32 {
        self.tags
            .number(Field::DiscNumber)
            .or(self.file_numbers().disc)
            .unwrap_or(1)
    }

    pub fn track_number(&self) -> Option<u32> {
        self.tags.number(Field::TrackNumber)
    }

    /// Numbers encoded in the file name.
    pub fn file_numbers(&self) -> FileNumbers {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(FileNumbers::parse)
            .unwrap_or_default()
    }
}

/// Track and disc numbers read from a file name.
///
/// A leading run of 2 to 4 digits holds the track number in its last two
/// digits and the disc in the rest (`"203 - Pigs.flac"` is disc 2, track 3).
/// Four-digit runs that read as a year are skipped. Failing that, a lone
/// 1 or 2 digit number set off by spaces, dashes or underscores is taken
/// as the track number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileNumbers {
    pub track: Option<u32>,
    pub disc: Option<u32>,
}

impl FileNumbers {
    pub fn parse(name: &str) -> Self {
        let mut numbers = Self::default();

        let lead_len = name.bytes().take_while(u8::is_ascii_digit).count();
        let lead = &name[..lead_len];
        let is_year = lead_len == 4 && lead.parse::<u32>().is_ok_and(|y| (1900..=2099).contains(&y));
        if (2..=4).contains(&lead_len) && !is_year {
            let (disc, track) = lead.split_at(lead_len - 2);
            numbers.track = positive(track);
            numbers.disc = positive(disc);
        }

        if numbers.track.is_none() {
            numbers.track = delimited_number(name);
        }
        numbers
    }
}

fn positive(digits: &str) -> Option<u32> {
    digits.parse().ok().filter(|&n| n > 0)
}

/// The only 1-2 digit number in `name` with a separator on both sides.
fn delimited_number(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();
    let is_separator = |b: &u8| matches!(b, b' ' | b'-' | b'_');

    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let before = start.checked_sub(1).and_then(|j| bytes.get(j));
        if i - start <= 2 && before.is_some_and(is_separator) && bytes.get(i).is_some_and(is_separator) {
            found.push(&name[start..i]);
        }
    }

    match found.as_slice() {
        [only] => positive(only),
        _ => None,
    }
}

/// A directory's worth of tracks presumed to form one album.
///
/// Tracks are grouped by disc at construction. Within a disc, numbered
/// tracks are sorted by track number among the positions numbered tracks
/// occupy, while tracks with no number stay at their discovery position.
/// The set of tracks never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    tracks: Vec<Track>,
}

impl Release {
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut discs: BTreeMap<u32, Vec<Track>> = BTreeMap::new();
        for track in tracks {
            discs.entry(track.disc()).or_default().push(track);
        }
        Self {
            tracks: discs.into_values().flat_map(order_disc).collect(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Mutable access to one track's tags. Only the applier edits tags.
    pub(crate) fn tags_mut(&mut self, index: usize) -> Option<&mut TagSet> {
        self.tracks.get_mut(index).map(|t| &mut t.tags)
    }

    /// Per-track values of a field, blank text counted as absent.
    pub fn values(&self, field: Field) -> Vec<Option<TagValue>> {
        self.tracks
            .iter()
            .map(|t| present(t.tags(), field))
            .collect()
    }

    /// Album artist for the release: the most common per-track album
    /// artist, falling back to the track artist where it is missing.
    pub fn album_artist(&self) -> Option<String> {
        mode(self.tracks.iter().filter_map(|t| {
            t.tags()
                .text(Field::AlbumArtist)
                .or_else(|| t.tags().text(Field::Artist))
        }))
        .map(|m| m.value.to_string())
    }

    /// Most common album title across tracks.
    pub fn album(&self) -> Option<String> {
        mode(self.tracks.iter().filter_map(|t| t.tags().text(Field::Album)))
            .map(|m| m.value.to_string())
    }

    /// Most common release year across tracks.
    pub fn year(&self) -> Option<u32> {
        mode(
            self.tracks
                .iter()
                .filter_map(|t| t.tags().number(Field::Year)),
        )
        .map(|m| m.value)
    }

    /// Highest track number present, or the track count when none are.
    pub fn total_tracks(&self) -> u32 {
        self.tracks
            .iter()
            .filter_map(Track::track_number)
            .max()
            .unwrap_or(self.tracks.len() as u32)
    }
}

/// Order one disc's tracks in discovery order.
fn order_disc(tracks: Vec<Track>) -> Vec<Track> {
    let (mut numbered, unnumbered): (Vec<_>, Vec<_>) = tracks
        .into_iter()
        .enumerate()
        .partition(|(_, t)| t.track_number().is_some());

    let slots: Vec<usize> = numbered.iter().map(|(slot, _)| *slot).collect();
    // Stable: equal numbers keep discovery order
    numbered.sort_by_key(|(_, t)| t.track_number());

    let mut placed: Vec<(usize, Track)> = slots
        .into_iter()
        .zip(numbered.into_iter().map(|(_, t)| t))
        .chain(unnumbered)
        .collect();
    placed.sort_by_key(|(slot, _)| *slot);
    placed.into_iter().map(|(_, t)| t).collect()
}

/// Field value with surrounding whitespace trimmed and blank text treated
/// as absent.
pub(crate) fn present(tags: &TagSet, field: Field) -> Option<TagValue> {
    match tags.get(field)? {
        TagValue::Text(s) => non_blank(s.trim()),
        number => Some(number.clone()),
    }
}

/// The most frequent value in a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mode<T> {
    pub value: T,
    pub count: usize,
    /// False when another value shares the top count
    pub unique: bool,
}

/// Compute the mode. Ties resolve to the value seen first.
pub(crate) fn mode<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Option<Mode<T>> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let top = counts.iter().map(|(_, n)| *n).max()?;
    let unique = counts.iter().filter(|(_, n)| *n == top).count() == 1;
    let (value, count) = counts.into_iter().find(|(_, n)| *n == top)?;
    Some(Mode {
        value,
        count,
        unique,
    })
}

/// An externally sourced description of what a release should look like.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCandidate {
    /// Provider identifier, if the provider has one
    pub id: Option<String>,
    pub album_artist: String,
    pub album: String,
    pub year: Option<u32>,
    /// Canonical track titles in release order
    pub track_titles: Vec<String>,
    /// Informational only; ignored when matching
    pub country: Option<String>,
    /// Informational only; ignored when matching
    pub format: Option<String>,
}

impl CanonicalCandidate {
    /// Canonical value for a release-level field, if the candidate has one.
    pub fn album_value(&self, field: Field) -> Option<TagValue> {
        match field {
            Field::AlbumArtist => non_blank(&self.album_artist),
            Field::Album => non_blank(&self.album),
            Field::Year => self.year.map(TagValue::Number),
            _ => None,
        }
    }

    /// Canonical title at a release position.
    pub fn title_at(&self, position: usize) -> Option<&str> {
        self.track_titles
            .get(position)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

fn non_blank(s: &str) -> Option<TagValue> {
    (!s.trim().is_empty()).then(|| TagValue::Text(s.to_string()))
}
