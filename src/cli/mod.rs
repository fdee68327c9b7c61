//! Command-line interface for release-mender.
//!
//! Validates, repairs and renames releases from the terminal.

mod commands;

pub use commands::{Cli, Commands, run_command};
