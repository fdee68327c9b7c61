//! Test utilities and fixtures for release-mender tests.
//!
//! This module provides common test helpers, an in-memory tag store and
//! release builders to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use release_mender::test_utils::{MemoryTagIo, release_with};
//!
//! let release = release_with(vec![mock_tags(1), mock_tags(2)]);
//! let io = MemoryTagIo::seeded(&release);
//! io.fail_write_on(release.tracks()[1].path());
//! ```

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::metadata::{TagIo, TagReadError, TagWriteError};
use crate::model::{CanonicalCandidate, Field, Release, TagSet, Track};

/// In-memory [`TagIo`] with failure injection.
///
/// Files are keyed by path. Reads of unknown paths fail like a missing file.
#[derive(Default)]
pub struct MemoryTagIo {
    files: Mutex<HashMap<PathBuf, TagSet>>,
    failing_reads: Mutex<HashSet<PathBuf>>,
    failing_writes: Mutex<HashSet<PathBuf>>,
    writes: Mutex<Vec<PathBuf>>,
}

impl MemoryTagIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with every track of a release.
    pub fn seeded(release: &Release) -> Self {
        let io = Self::new();
        for track in release.tracks() {
            io.insert(track.path(), track.tags().clone());
        }
        io
    }

    pub fn insert(&self, path: impl Into<PathBuf>, tags: TagSet) {
        self.files.lock().insert(path.into(), tags);
    }

    pub fn get(&self, path: &Path) -> Option<TagSet> {
        self.files.lock().get(path).cloned()
    }

    pub fn fail_read_on(&self, path: impl Into<PathBuf>) {
        self.failing_reads.lock().insert(path.into());
    }

    pub fn fail_write_on(&self, path: impl Into<PathBuf>) {
        self.failing_writes.lock().insert(path.into());
    }

    /// Paths successfully written, in write order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().clone()
    }
}

impl TagIo for MemoryTagIo {
    fn read(&self, path: &Path) -> Result<TagSet, TagReadError> {
        if self.failing_reads.lock().contains(path) {
            return Err(TagReadError::new(path, "corrupt header"));
        }
        self.get(path)
            .ok_or_else(|| TagReadError::new(path, "no such file"))
    }

    fn write(&self, path: &Path, tags: &TagSet) -> Result<(), TagWriteError> {
        if self.failing_writes.lock().contains(path) {
            return Err(TagWriteError::new(path, "read-only file system"));
        }
        self.files.lock().insert(path.to_path_buf(), tags.clone());
        self.writes.lock().push(path.to_path_buf());
        Ok(())
    }
}

/// Fully tagged track tags for position `n` of a mock album.
pub fn mock_tags(n: u32) -> TagSet {
    TagSet::new()
        .with(Field::Title, format!("Track {}", n))
        .with(Field::Artist, "Pink Floyd")
        .with(Field::AlbumArtist, "Pink Floyd")
        .with(Field::Album, "Animals")
        .with(Field::Year, 1977u32)
        .with(Field::TrackNumber, n)
}

/// Build a release from tag sets, one file per tag set, in the given order.
pub fn release_with(tags: Vec<TagSet>) -> Release {
    let tracks = tags
        .into_iter()
        .enumerate()
        .map(|(i, t)| Track::new(format!("/music/release/{:02}.flac", i + 1), t))
        .collect();
    Release::new(tracks)
}

/// A release whose tracks carry the given track numbers, in discovery order.
pub fn release_numbered(numbers: &[Option<u32>]) -> Release {
    release_with(
        numbers
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let mut tags = mock_tags(i as u32 + 1);
                tags.remove(Field::TrackNumber);
                match n {
                    Some(n) => tags.with(Field::TrackNumber, *n),
                    None => tags,
                }
            })
            .collect(),
    )
}

/// Canonical candidate matching [`mock_tags`] albums of `count` tracks.
pub fn mock_candidate(count: u32) -> CanonicalCandidate {
    CanonicalCandidate {
        id: Some("mock-release-id".to_string()),
        album_artist: "Pink Floyd".to_string(),
        album: "Animals".to_string(),
        year: Some(1977),
        track_titles: (1..=count).map(|n| format!("Track {}", n)).collect(),
        country: Some("GB".to_string()),
        format: Some("CD".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_io_round_trip() {
        let io = MemoryTagIo::new();
        let path = Path::new("/music/a.flac");
        let mut tags = mock_tags(1);
        tags.extra.insert("MOOD".to_string(), "bleak".to_string());

        io.write(path, &tags).unwrap();

        assert_eq!(io.read(path).unwrap(), tags);
        assert_eq!(io.writes(), vec![path.to_path_buf()]);
    }

    #[test]
    fn test_memory_io_failures() {
        let io = MemoryTagIo::new();
        io.fail_write_on("/music/b.flac");

        assert!(io.read(Path::new("/music/missing.flac")).is_err());
        assert!(io.write(Path::new("/music/b.flac"), &TagSet::new()).is_err());
        assert!(io.writes().is_empty());
    }

    #[test]
    fn test_release_numbered_keeps_discovery_order_for_ties() {
        let release = release_numbered(&[Some(1), Some(2), Some(2), None]);
        let titles: Vec<_> = release
            .tracks()
            .iter()
            .map(|t| t.tags().text(Field::Title).unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Track 1", "Track 2", "Track 3", "Track 4"]);
    }

    #[test]
    fn test_mock_candidate_defaults() {
        let candidate = mock_candidate(3);
        assert_eq!(candidate.track_titles.len(), 3);
        assert_eq!(candidate.album, "Animals");
    }
}
