//! Release loading: discover a directory's audio files and read their tags.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::metadata::{TagIo, TagReadError};
use crate::model::{Release, Track};
use crate::scanner;

/// A release read from disk, with the tracks that had to be left out.
#[derive(Debug, Clone)]
pub struct LoadedRelease {
    /// Directory the release was loaded from
    pub root: PathBuf,
    pub release: Release,
    /// Tracks whose tags could not be read; excluded from `release`
    pub skipped: Vec<TagReadError>,
}

/// Load every audio file under `root` as one release.
///
/// Unreadable tracks are logged and skipped. Loading only fails when no
/// track could be read at all.
pub fn load_release<S: AsRef<str>>(
    root: &Path,
    io: &dyn TagIo,
    extensions: &[S],
) -> Result<LoadedRelease> {
    let mut tracks = Vec::new();
    let mut skipped = Vec::new();

    for rel in scanner::list(root) {
        if !scanner::is_audio(&rel, extensions) {
            continue;
        }
        let path = root.join(&rel);
        match io.read(&path) {
            Ok(tags) => tracks.push(Track::new(path, tags)),
            Err(e) => {
                tracing::warn!("Excluding track from release: {}", e);
                skipped.push(e);
            }
        }
    }

    if tracks.is_empty() {
        // A lone unreadable track is reported as itself
        return Err(match skipped.len() {
            1 => Error::TagRead(skipped.remove(0)),
            _ => Error::empty_release(root),
        });
    }

    tracing::debug!(
        "Loaded {} tracks from {:?} ({} skipped)",
        tracks.len(),
        root,
        skipped.len()
    );

    Ok(LoadedRelease {
        root: root.to_path_buf(),
        release: Release::new(tracks),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, TagSet};
    use crate::scanner::DEFAULT_EXTENSIONS;
    use crate::test_utils::MemoryTagIo;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_load_skips_unreadable_tracks() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in ["01.flac", "02.flac", "03.flac", "folder.jpg"] {
            File::create(root.join(name)).unwrap();
        }

        let io = MemoryTagIo::new();
        io.insert(root.join("01.flac"), TagSet::new().with(Field::TrackNumber, 1u32));
        io.insert(root.join("03.flac"), TagSet::new().with(Field::TrackNumber, 3u32));
        io.fail_read_on(root.join("02.flac"));

        let loaded = load_release(root, &io, DEFAULT_EXTENSIONS).unwrap();

        assert_eq!(loaded.release.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].path, root.join("02.flac"));
        assert_eq!(loaded.root, root);
    }

    #[test]
    fn test_load_single_unreadable_track_is_an_error() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("only.mp3")).unwrap();

        let io = MemoryTagIo::new();
        io.fail_read_on(dir.path().join("only.mp3"));

        let result = load_release(dir.path(), &io, DEFAULT_EXTENSIONS);
        assert!(matches!(result, Err(Error::TagRead(_))));
    }

    #[test]
    fn test_load_without_audio_is_empty_release() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let result = load_release(dir.path(), &MemoryTagIo::new(), DEFAULT_EXTENSIONS);
        assert!(matches!(result, Err(Error::EmptyRelease(_))));
    }
}
