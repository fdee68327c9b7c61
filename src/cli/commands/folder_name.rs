//! Folder name command.

use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::{Context, for_each_release};

/// Print `<dir> -> <canonical name>` for every release under `path`
pub(crate) fn cmd_folder_name(rt: &Runtime, ctx: Arc<Context>, path: &Path) -> anyhow::Result<()> {
    let dirs = ctx.discover(path)?;
    let workers = ctx.config.library.workers;

    let results = rt.block_on(for_each_release(dirs.clone(), workers, |dir| {
        let ctx = ctx.clone();
        async move {
            let loaded = ctx.load(dir).await?;
            anyhow::Ok(ctx.engine.folder_name(&loaded.release))
        }
    }));

    for (dir, result) in dirs.iter().zip(results) {
        match result {
            Ok(name) => println!("{} -> {}", dir.display(), name),
            Err(e) => eprintln!("{}: {}", dir.display(), e),
        }
    }
    Ok(())
}
