//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\release-mender\config.toml
//! - macOS: ~/Library/Application Support/release-mender/config.toml
//! - Linux: ~/.config/release-mender/config.toml
//!
//! Every section is optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::{ThresholdError, Thresholds};
use crate::lookup::musicbrainz::DEFAULT_BASE_URL;
use crate::scanner::DEFAULT_EXTENSIONS;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Match floor and confidence gates
    pub matching: Thresholds,

    /// Canonical metadata provider
    pub lookup: LookupConfig,

    /// Release discovery and batch processing
    pub library: LibraryConfig,
}

/// Canonical lookup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Query the provider at all
    pub enabled: bool,

    /// MusicBrainz web service root
    pub base_url: String,

    /// Per-query timeout in seconds
    pub timeout_secs: u64,

    /// Queries in flight at once
    pub max_concurrent: usize,

    /// Releases fetched per search
    pub max_candidates: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 20,
            max_concurrent: 2,
            max_candidates: 3,
        }
    }
}

/// Library settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Releases processed concurrently
    pub workers: usize,

    /// File extensions treated as tracks (lowercase, no dot)
    pub extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate()?;
        if self.library.workers == 0 {
            return Err(ConfigError::Invalid("library.workers must be at least 1".to_string()));
        }
        if self.library.extensions.is_empty() {
            return Err(ConfigError::Invalid("library.extensions must not be empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("release-mender"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config: Config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid matching thresholds: {0}")]
    Thresholds(#[from] ThresholdError),
}

// ============================================================================
// Tests
// ============================================================================
