//! File discovery.
//!
//! Lists candidate files under a root and groups audio files into release
//! directories. Traversal errors (permission denied, vanished entries) are
//! skipped rather than aborting the scan.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Audio extensions treated as tracks when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "opus", "m4a", "mp4", "aac", "wav", "aiff", "ape", "wv", "mpc",
];

/// Recursively list the files under `root`, relative to it.
///
/// Order is deterministic: entries are visited sorted by file name.
pub fn list(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {:?}: {}", root, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

/// Whether `path` has one of the given audio extensions (case-insensitive).
pub fn is_audio<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|candidate| candidate.as_ref().eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Find release directories under `root`.
///
/// A release is a directory that directly contains at least one audio file.
/// Directories nested inside a release (e.g. `CD1/`) belong to it and are
/// not reported separately.
pub fn discover_releases<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Vec<PathBuf> {
    let audio_dirs: BTreeSet<PathBuf> = list(root)
        .into_iter()
        .filter(|rel| is_audio(rel, extensions))
        .map(|rel| {
            root.join(rel)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf())
        })
        .collect();

    let mut releases: Vec<PathBuf> = Vec::new();
    // BTreeSet order puts parents before their children
    for dir in audio_dirs {
        if !releases.iter().any(|r| dir.starts_with(r)) {
            releases.push(dir);
        }
    }
    releases
}
