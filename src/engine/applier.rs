//! Applying a repair plan to memory and then to disk.

use std::collections::BTreeSet;

use super::planner::RepairPlan;
use crate::metadata::{TagIo, TagWriteError};
use crate::model::Release;
use crate::organizer::sanitize_filename;

/// Name used when a release has no artist, year or album.
pub const UNKNOWN_FOLDER: &str = "Unknown Album";

/// Errors from [`RepairApplier::apply`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplyError {
    /// The plan does not fit the release; nothing was written
    #[error("Invalid edit #{index}: {reason}")]
    InvalidEdit { index: usize, reason: String },

    /// Writing stopped at track index `failed_at`; tracks in `written` are
    /// already on disk. Displayed 1-based.
    #[error("Write failed at track {} after {} written: {cause}", failed_at + 1, written.len())]
    PartialWrite {
        written: Vec<usize>,
        failed_at: usize,
        cause: TagWriteError,
    },
}

/// Commits repair plans through a tag writer.
pub struct RepairApplier<'a> {
    io: &'a dyn TagIo,
}

impl<'a> RepairApplier<'a> {
    pub fn new(io: &'a dyn TagIo) -> Self {
        Self { io }
    }

    /// Apply every edit in memory, then write touched tracks in track order.
    ///
    /// Edits are absolute, so applying the same plan again converges on the
    /// same tags. A failed write stops the run without undoing earlier
    /// writes; the error lists what was committed.
    pub fn apply(&self, release: &Release, plan: RepairPlan) -> Result<Release, ApplyError> {
        let mut updated = release.clone();
        let mut touched = BTreeSet::new();

        for (index, edit) in plan.edits().iter().enumerate() {
            let invalid = |reason: String| ApplyError::InvalidEdit { index, reason };
            let tags = updated
                .tags_mut(edit.track)
                .ok_or_else(|| invalid(format!("no track at position {}", edit.track)))?;
            tags.set(edit.field, edit.new.clone())
                .map_err(|v| invalid(format!("{:?} is not a valid {}", v.to_string(), edit.field)))?;
            touched.insert(edit.track);
        }

        let mut written = Vec::with_capacity(touched.len());
        for index in touched {
            let Some(track) = updated.track(index) else {
                continue;
            };
            if let Err(cause) = self.io.write(track.path(), track.tags()) {
                tracing::warn!(
                    "Stopped at track {} after {} writes: {}",
                    index + 1,
                    written.len(),
                    cause
                );
                return Err(ApplyError::PartialWrite {
                    written,
                    failed_at: index,
                    cause,
                });
            }
            written.push(index);
        }

        if !written.is_empty() {
            tracing::info!("Wrote tags for {} tracks", written.len());
        }
        Ok(updated)
    }
}

/// Canonical folder name: `"{AlbumArtist} - {Year} - {Album}"`.
///
/// Absent parts are left out along with their separator. Characters that
/// are unsafe in file names become `_`.
pub fn folder_name(release: &Release) -> String {
    let parts: Vec<String> = [
        release.album_artist(),
        release.year().map(|y| y.to_string()),
        release.album(),
    ]
    .into_iter()
    .flatten()
    .map(|p| sanitize_filename(p.trim()))
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        return UNKNOWN_FOLDER.to_string();
    }
    parts.join(" - ")
}
