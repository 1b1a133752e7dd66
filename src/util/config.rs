//! Configuration file support.
//!
//! The installers read an optional user config at `~/.prereqs/config.toml`
//! (overridable with `--config`). Every setting is optional; command-line
//! flags take precedence over the file, and the file over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::BuildSystem;

/// Installer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Install root (a leading `~` is expanded)
    pub prefix: Option<PathBuf>,

    /// Where library sources are checked out
    pub workdir: Option<PathBuf>,

    /// Build system for libraries that support more than one
    pub buildsys: Option<BuildSystem>,

    /// Parallel jobs handed to make/ctest
    pub jobs: Option<usize>,

    /// Run build commands under `nice` on Linux
    pub nice: Option<bool>,

    /// Stop after the first library that fails to build
    pub fail_fast: Option<bool>,
}

/// Network configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Download timeout in seconds
    pub timeout: Option<u64>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing
    /// or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}

/// Get the global config directory (~/.prereqs).
pub fn global_config_dir(home: &Path) -> PathBuf {
    home.join(".prereqs")
}

/// Get the global config path (~/.prereqs/config.toml).
pub fn global_config_path(home: &Path) -> PathBuf {
    global_config_dir(home).join("config.toml")
}
