//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `validate` - Report violations without changing anything
//! - `fix` - Plan repairs and optionally write them and rename folders
//! - `folder_name` - Print the canonical folder name of each release
//!
//! Every command accepts a release directory or a library root; each
//! directory that directly holds audio files is processed as one release,
//! several at a time.

mod fix;
mod folder_name;
mod report;
mod validate;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::engine::Engine;
use crate::library::{self, LoadedRelease};
use crate::lookup::{BoundedLookup, CachedLookup, MusicBrainzLookup};
use crate::metadata::LoftyTagIo;
use crate::scanner;

use fix::cmd_fix;
use folder_name::cmd_folder_name;
use validate::cmd_validate;

/// Release Mender CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the OS config directory)
    #[arg(long, global = true, env = "RELEASE_MENDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip the canonical metadata lookup
    #[arg(long, global = true)]
    pub no_lookup: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Report metadata problems in one or more releases
    Validate {
        /// Release directory or library root
        path: PathBuf,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Plan and optionally apply metadata repairs
    Fix {
        /// Release directory or library root
        path: PathBuf,
        /// Write the planned edits to the files (default: dry run)
        #[arg(long)]
        write: bool,
        /// Rename each release directory to its canonical folder name
        #[arg(long)]
        rename: bool,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the canonical folder name of each release
    FolderName {
        /// Release directory or library root
        path: PathBuf,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    config.validate()?;

    let engine = build_engine(&config, cli.no_lookup)?;
    let ctx = Arc::new(Context { engine, config });
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Validate { path, json } => cmd_validate(&rt, ctx, path, *json),
        Commands::Fix {
            path,
            write,
            rename,
            json,
        } => cmd_fix(
            &rt,
            ctx,
            path,
            fix::FixOptions {
                write: *write,
                rename: *rename,
                json: *json,
            },
        ),
        Commands::FolderName { path } => cmd_folder_name(&rt, ctx, path),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Everything a command needs to process one release
pub(crate) struct Context {
    pub engine: Engine,
    pub config: Config,
}

impl Context {
    /// Release directories under `path`, or an error if there are none
    pub fn discover(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        if !path.is_dir() {
            anyhow::bail!("{} is not a directory", path.display());
        }
        let dirs = scanner::discover_releases(path, &self.config.library.extensions);
        if dirs.is_empty() {
            anyhow::bail!("No audio files found under {}", path.display());
        }
        tracing::info!("Found {} releases under {:?}", dirs.len(), path);
        Ok(dirs)
    }

    /// Load a release off the async runtime
    pub async fn load(&self, dir: PathBuf) -> anyhow::Result<LoadedRelease> {
        let extensions = self.config.library.extensions.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            library::load_release(&dir, &LoftyTagIo, &extensions)
        })
        .await??;
        Ok(loaded)
    }
}

/// Build the engine, wiring in the lookup stack unless disabled.
fn build_engine(config: &Config, no_lookup: bool) -> anyhow::Result<Engine> {
    let engine = Engine::new(config.matching);
    if no_lookup || !config.lookup.enabled {
        tracing::info!("Canonical lookup disabled");
        return Ok(engine);
    }

    let provider =
        MusicBrainzLookup::with_base_url(&config.lookup.base_url, config.lookup.max_candidates)?;
    let lookup = BoundedLookup::new(
        CachedLookup::new(provider),
        config.lookup.max_concurrent,
        Duration::from_secs(config.lookup.timeout_secs),
    );
    Ok(engine.with_lookup(Arc::new(lookup)))
}

/// Run `task` for every release directory, `workers` at a time.
///
/// Results come back in the order of `dirs`.
pub(crate) async fn for_each_release<F, Fut, T>(dirs: Vec<PathBuf>, workers: usize, task: F) -> Vec<T>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = T>,
{
    let mut results: Vec<(usize, T)> = futures::stream::iter(dirs.into_iter().enumerate())
        .map(|(i, dir)| {
            let fut = task(dir);
            async move { (i, fut.await) }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    results.sort_by_key(|(i, _)| *i);
    results.into_iter().map(|(_, r)| r).collect()
}
