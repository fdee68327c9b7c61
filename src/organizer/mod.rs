//! Release directory naming.
//!
//! Moves a release directory to its canonical folder name next to where it
//! already lives: `/music/incoming/animals` becomes
//! `/music/incoming/Pink Floyd - 1977 - Animals`.
//!
//! # Features
//! - Preview mode to see the target before renaming
//! - Refuses to overwrite an existing directory

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};

/// Planned or completed directory rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePreview {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl RenamePreview {
    /// Whether the directory already has the target name
    pub fn is_noop(&self) -> bool {
        self.source == self.destination
    }
}

/// Work out where `dir` would move to when renamed to `name` (dry-run).
pub fn preview_rename(dir: &Path, name: &str) -> Result<RenamePreview> {
    let name = sanitize_filename(name.trim());
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::organization(format!("{:?} is not a usable folder name", name)));
    }
    let parent = dir
        .parent()
        .ok_or_else(|| Error::organization(format!("{:?} has no parent directory", dir)))?;

    Ok(RenamePreview {
        source: dir.to_path_buf(),
        destination: parent.join(name),
    })
}

/// Rename a release directory in place to `name`.
///
/// Returns the new path. Renaming to the current name is a no-op.
pub fn rename_release_dir(dir: &Path, name: &str) -> Result<PathBuf> {
    let preview = preview_rename(dir, name)?;
    if preview.is_noop() {
        return Ok(preview.destination);
    }
    if preview.destination.exists() {
        return Err(Error::organization(format!(
            "cannot rename {:?}: {:?} already exists",
            preview.source, preview.destination
        )));
    }

    fs::rename(&preview.source, &preview.destination)
        .with_context(format!("Failed to rename {:?}", preview.source))?;

    tracing::info!("Renamed {:?} -> {:?}", preview.source, preview.destination);
    Ok(preview.destination)
}

/// Sanitizes a filename by replacing characters that are invalid on common
/// file systems with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("AC/DC"), "AC_DC");
        assert_eq!(sanitize_filename("Track: Title"), "Track_ Title");
        assert_eq!(sanitize_filename("Valid Name"), "Valid Name");
        assert_eq!(sanitize_filename("Artist?"), "Artist_");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
        assert_eq!(sanitize_filename("pipe|test"), "pipe_test");
    }

    #[test]
    fn test_preview_rename_stays_in_parent() {
        let preview = preview_rename(Path::new("/music/incoming/animals"), "Pink Floyd - 1977 - Animals")
            .unwrap();
        assert_eq!(
            preview.destination,
            PathBuf::from("/music/incoming/Pink Floyd - 1977 - Animals")
        );
        assert!(!preview.is_noop());
    }

    #[test]
    fn test_preview_rename_sanitizes_and_rejects_empty() {
        let preview = preview_rename(Path::new("/music/x"), "AC/DC - Back: In Black").unwrap();
        assert_eq!(preview.destination, PathBuf::from("/music/AC_DC - Back_ In Black"));

        assert!(preview_rename(Path::new("/music/x"), "   ").is_err());
        assert!(preview_rename(Path::new("/music/x"), "..").is_err());
    }

    #[test]
    fn test_rename_release_dir_moves_contents() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("animals");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("01.flac"), b"fake flac content").unwrap();

        let renamed = rename_release_dir(&source, "Pink Floyd - 1977 - Animals").unwrap();

        assert!(!source.exists());
        assert_eq!(renamed, temp.path().join("Pink Floyd - 1977 - Animals"));
        assert_eq!(fs::read(renamed.join("01.flac")).unwrap(), b"fake flac content");
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("Pink Floyd - Animals");
        fs::create_dir_all(&dir).unwrap();

        assert_eq!(rename_release_dir(&dir, "Pink Floyd - Animals").unwrap(), dir);
        assert!(dir.exists());
    }

    #[test]
    fn test_rename_refuses_to_overwrite() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a");
        let taken = temp.path().join("b");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&taken).unwrap();

        let err = rename_release_dir(&source, "b").unwrap_err();
        assert!(matches!(err, Error::Organization(_)));
        assert!(source.exists());
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Generate valid filename characters (excluding path separators and invalid chars)
    fn valid_filename_char() -> impl Strategy<Value = char> {
        prop::char::range('!', '~').prop_filter("no invalid chars", |c| {
            !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
    }

    /// Generate a valid filename string
    fn valid_filename() -> impl Strategy<Value = String> {
        prop::collection::vec(valid_filename_char(), 1..50)
            .prop_map(|chars| chars.into_iter().collect())
    }

    /// Generate an arbitrary string that might contain invalid characters
    fn arbitrary_filename() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9 /:*?\"<>|_-]{1,50}")
            .unwrap()
            .prop_filter("non-empty", |s| !s.is_empty())
    }

    proptest! {
        /// Sanitized filenames should never contain path separators or Windows-invalid characters
        #[test]
        fn sanitize_removes_invalid_chars(input in arbitrary_filename()) {
            let sanitized = sanitize_filename(&input);
            for c in ['/', '\\', ':', '*', '?', '"', '<', '>', '|'] {
                prop_assert!(!sanitized.contains(c), "Found {} in: {}", c, sanitized);
            }
        }

        /// Sanitized filename length should be same as input length
        #[test]
        fn sanitize_preserves_length(input in arbitrary_filename()) {
            let sanitized = sanitize_filename(&input);
            prop_assert_eq!(input.chars().count(), sanitized.chars().count());
        }

        /// Valid filenames should pass through unchanged
        #[test]
        fn sanitize_preserves_valid_names(input in valid_filename()) {
            let sanitized = sanitize_filename(&input);
            prop_assert_eq!(input, sanitized);
        }

        /// A rename never leaves the release's parent directory
        #[test]
        fn preview_stays_beside_source(name in arbitrary_filename()) {
            let dir = Path::new("/music/library/incoming");
            if let Ok(preview) = preview_rename(dir, &name) {
                prop_assert_eq!(preview.destination.parent(), dir.parent());
            }
        }
    }
}
