//! Validation command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::report::{self, ReleaseReport};
use super::{Context, for_each_release};

/// Report violations for every release under `path`
pub(crate) fn cmd_validate(rt: &Runtime, ctx: Arc<Context>, path: &Path, json: bool) -> anyhow::Result<()> {
    let dirs = ctx.discover(path)?;
    let workers = ctx.config.library.workers;

    let reports = rt.block_on(for_each_release(dirs, workers, |dir| {
        let ctx = ctx.clone();
        async move { validate_release(&ctx, dir).await }
    }));

    report::emit(&reports, json)
}

async fn validate_release(ctx: &Context, dir: PathBuf) -> ReleaseReport {
    let mut report = ReleaseReport::new(&dir);
    let loaded = match ctx.load(dir.clone()).await {
        Ok(loaded) => loaded,
        Err(e) => return report.failed(e),
    };
    report.loaded(&loaded);

    let matched = ctx.engine.resolve_match(&loaded.release).await;
    report.violations = ctx.engine.validate_against(&loaded.release, matched.as_ref());
    report.matched = matched;
    report.folder_name = Some(ctx.engine.folder_name(&loaded.release));
    report.folder_name_ok = Some(ctx.engine.folder_name_matches(&loaded.release, &dir));

    tracing::debug!("{:?}: {} violations", dir, report.violations.len());
    report
}
