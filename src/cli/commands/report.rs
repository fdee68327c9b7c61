//! Per-release results and how they are printed.

use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::engine::{ApplyError, Edit, MatchOutcome, Violation};
use crate::library::LoadedRelease;
use crate::organizer::RenamePreview;

/// What happened to one release
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseReport {
    pub path: PathBuf,
    pub tracks: usize,
    /// Tracks left out because their tags could not be read
    pub skipped: Vec<String>,
    pub matched: Option<MatchOutcome>,
    pub violations: Vec<Violation>,
    pub edits: Vec<Edit>,
    pub unresolved: Vec<Violation>,
    /// Whether edits were written to disk
    pub written: bool,
    /// Track positions whose files were written, including those committed
    /// before a failed write
    pub written_tracks: Vec<usize>,
    /// Track position whose write failed
    pub failed_track: Option<usize>,
    pub folder_name: Option<String>,
    pub folder_name_ok: Option<bool>,
    pub rename: Option<RenamePreview>,
    pub renamed: bool,
    pub error: Option<String>,
}

impl ReleaseReport {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }

    /// Record load results
    pub fn loaded(&mut self, loaded: &LoadedRelease) {
        self.tracks = loaded.release.len();
        self.skipped = loaded.skipped.iter().map(ToString::to_string).collect();
    }

    /// Record a failed plan write, keeping which tracks made it to disk
    pub fn write_failed(mut self, error: anyhow::Error) -> Self {
        if let Some(ApplyError::PartialWrite {
            written, failed_at, ..
        }) = error.downcast_ref::<ApplyError>()
        {
            self.written_tracks = written.clone();
            self.failed_track = Some(*failed_at);
        }
        self.failed(error)
    }

    pub fn failed(mut self, error: impl Display) -> Self {
        tracing::warn!("{}: {}", self.path.display(), error);
        self.error = Some(error.to_string());
        self
    }
}

/// Full output of a batch run
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub generated_at: String,
    pub releases: &'a [ReleaseReport],
}

/// Print reports as JSON or text, followed by a summary
pub fn emit(reports: &[ReleaseReport], json: bool) -> anyhow::Result<()> {
    if json {
        let batch = BatchReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            releases: reports,
        };
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    for report in reports {
        print_text(report);
    }
    print_summary(reports);
    Ok(())
}

fn print_text(report: &ReleaseReport) {
    println!("{}", report.path.display());

    if let Some(ref error) = report.error {
        println!("  ✗ {}", error);
        if report.failed_track.is_some() && !report.written_tracks.is_empty() {
            println!("  ✓ written before failure: {}", track_list(&report.written_tracks));
        }
        println!();
        return;
    }

    println!("  Tracks: {}", report.tracks);
    for skipped in &report.skipped {
        println!("  ⚠ skipped: {}", skipped);
    }
    match &report.matched {
        Some(m) => println!(
            "  Match:  {} - {} (confidence: {:.0}%)",
            m.candidate.album_artist,
            m.candidate.album,
            m.confidence * 100.0
        ),
        None => println!("  Match:  none"),
    }

    for v in &report.violations {
        println!("  • {}", v);
    }
    for edit in &report.edits {
        let marker = if report.written { "✓" } else { "→" };
        println!("  {} {}", marker, edit);
    }
    for v in &report.unresolved {
        println!("  ? unresolved {}", v);
    }

    if let Some(ref name) = report.folder_name {
        let status = match report.folder_name_ok {
            Some(true) => "ok",
            _ => "differs",
        };
        println!("  Folder: {} ({})", name, status);
    }
    if let Some(ref rename) = report.rename
        && !rename.is_noop()
    {
        let verb = if report.renamed { "RENAMED" } else { "WOULD RENAME" };
        println!("  {}: -> {}", verb, rename.destination.display());
    }
    println!();
}

/// 1-based track positions for display
fn track_list(tracks: &[usize]) -> String {
    let numbers: Vec<String> = tracks.iter().map(|t| (t + 1).to_string()).collect();
    format!("tracks {}", numbers.join(", "))
}

fn print_summary(reports: &[ReleaseReport]) {
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    let violations: usize = reports.iter().map(|r| r.violations.len()).sum();
    let edits: usize = reports.iter().map(|r| r.edits.len()).sum();
    let unresolved: usize = reports.iter().map(|r| r.unresolved.len()).sum();

    println!("=== Summary ===");
    println!("Releases:   {}", reports.len());
    println!("Failed:     {}", failed);
    println!("Violations: {}", violations);
    println!("Edits:      {}", edits);
    println!("Unresolved: {}", unresolved);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TagWriteError;

    #[test]
    fn test_failed_report_keeps_error() {
        let report = ReleaseReport::new(Path::new("/music/a")).failed("no readable tracks");
        assert_eq!(report.error.as_deref(), Some("no readable tracks"));
        assert_eq!(report.path, PathBuf::from("/music/a"));
    }

    #[test]
    fn test_partial_write_is_recorded() {
        let error = ApplyError::PartialWrite {
            written: vec![0, 1],
            failed_at: 3,
            cause: TagWriteError::new("/music/a/04.flac", "read-only file system"),
        };
        let report = ReleaseReport::new(Path::new("/music/a")).write_failed(error.into());

        assert_eq!(report.written_tracks, vec![0, 1]);
        assert_eq!(report.failed_track, Some(3));
        assert!(report.error.as_deref().is_some_and(|e| e.starts_with("Write failed at track 4 after 2 written")));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed_track"], 3);
        assert_eq!(json["written_tracks"], serde_json::json!([0, 1]));
    }

    #[test]
    fn test_other_write_errors_carry_no_progress() {
        let error = ApplyError::InvalidEdit {
            index: 0,
            reason: "no track at position 9".to_string(),
        };
        let report = ReleaseReport::new(Path::new("/music/a")).write_failed(error.into());
        assert!(report.written_tracks.is_empty());
        assert_eq!(report.failed_track, None);
        assert!(report.error.is_some());
    }

    #[test]
    fn test_track_list_is_one_based() {
        assert_eq!(track_list(&[0, 2]), "tracks 1, 3");
    }

    #[test]
    fn test_batch_report_serializes() {
        let reports = vec![ReleaseReport::new(Path::new("/music/a"))];
        let batch = BatchReport {
            generated_at: "2025-01-01T00:00:00+00:00".to_string(),
            releases: &reports,
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["releases"][0]["path"], "/music/a");
        assert_eq!(json["releases"][0]["written"], false);
        assert!(json["releases"][0]["matched"].is_null());
    }
}
