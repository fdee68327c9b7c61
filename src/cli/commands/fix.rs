//! Repair command.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::report::{self, ReleaseReport};
use super::{Context, for_each_release};
use crate::engine::{Engine, RepairPlan};
use crate::metadata::LoftyTagIo;
use crate::model::Release;
use crate::organizer;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FixOptions {
    pub write: bool,
    pub rename: bool,
    pub json: bool,
}

/// Plan repairs for every release under `path`, writing them if asked
pub(crate) fn cmd_fix(rt: &Runtime, ctx: Arc<Context>, path: &Path, opts: FixOptions) -> anyhow::Result<()> {
    let dirs = ctx.discover(path)?;
    let workers = ctx.config.library.workers;

    if !opts.write && !opts.json {
        println!("[DRY RUN MODE - No files will be changed, use --write to apply]");
        println!();
    }

    let reports = rt.block_on(for_each_release(dirs, workers, |dir| {
        let ctx = ctx.clone();
        async move { fix_release(&ctx, dir, opts).await }
    }));

    report::emit(&reports, opts.json)
}

async fn fix_release(ctx: &Context, dir: PathBuf, opts: FixOptions) -> ReleaseReport {
    let mut report = ReleaseReport::new(&dir);
    let loaded = match ctx.load(dir.clone()).await {
        Ok(loaded) => loaded,
        Err(e) => return report.failed(e),
    };
    report.loaded(&loaded);

    let outcome = ctx.engine.fix(&loaded.release).await;
    report.matched = outcome.matched.clone();
    report.edits = outcome.plan.edits().to_vec();
    report.unresolved = outcome.unresolved().to_vec();

    let release = if opts.write && !outcome.plan.is_empty() {
        let touched: BTreeSet<usize> = outcome.plan.edits().iter().map(|e| e.track).collect();
        match apply(ctx.engine.clone(), loaded.release, outcome.plan).await {
            Ok(updated) => {
                report.written = true;
                report.written_tracks = touched.into_iter().collect();
                updated
            }
            Err(e) => return report.write_failed(e),
        }
    } else {
        loaded.release
    };

    let name = ctx.engine.folder_name(&release);
    report.folder_name_ok = Some(ctx.engine.folder_name_matches(&release, &dir));
    report.folder_name = Some(name.clone());

    if opts.rename {
        // A dry run only previews the rename
        let preview = match organizer::preview_rename(&dir, &name) {
            Ok(preview) => preview,
            Err(e) => return report.failed(e),
        };
        if opts.write && !preview.is_noop() {
            match organizer::rename_release_dir(&dir, &name) {
                Ok(_) => report.renamed = true,
                Err(e) => {
                    report.rename = Some(preview);
                    return report.failed(e);
                }
            }
        }
        report.rename = Some(preview);
    }

    report
}

/// Write a plan off the async runtime
async fn apply(engine: Engine, release: Release, plan: RepairPlan) -> anyhow::Result<Release> {
    let updated =
        tokio::task::spawn_blocking(move || engine.apply(&release, plan, &LoftyTagIo)).await??;
    Ok(updated)
}
