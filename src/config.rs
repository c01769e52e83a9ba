use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted configuration for repofetch.
///
/// Holds the single GitHub API token, stored as YAML under the XDG config
/// directory and used to populate the `Authorization` header on listing
/// requests when present.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// GitHub API token, sent as `Authorization: token <value>` when set.
    #[serde(default)]
    pub token: Option<String>,
}

impl Config {
    /// Load configuration from a specific path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default location, falling back to an
    /// empty configuration when the file does not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the given path, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_yaml::to_string(self).context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Default configuration file path (XDG config dir).
    pub fn default_config_path() -> Result<PathBuf> {
        let base = config_dir().context("Could not determine config directory")?;
        Ok(base.join("repofetch").join("config.yml"))
    }
}

/// Per-run options assembled from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run `git pull` in repositories that are already present and non-empty.
    pub update: bool,

    /// Drop forked repositories from the discovered set.
    pub skip_forks: bool,

    /// Forward git's stdout/stderr instead of discarding it.
    pub verbose: bool,
}
