use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Top-level configuration stored on disk.
///
/// Every field has a default so a partial (or absent) config file still
/// loads; `gdash` works out of the box against a local backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Weather backend base URL, up to and including the API version.
    pub base_url: String,

    /// Public character-listing API base URL.
    pub people_base_url: String,

    /// City used when the user doesn't name one.
    pub default_city: String,

    /// Log page size for the dashboard table.
    pub page_size: u32,

    /// How many recent insights the correlator scans when matching a city.
    /// Matches older than this window are not found.
    pub insight_window: u32,

    /// Attempt budget when waiting for a freshly generated insight.
    pub poll_attempts: u32,

    /// Delay between poll attempts, in milliseconds.
    pub poll_interval_ms: u64,

    /// Default lookback window, in days, for insight generation.
    pub default_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            people_base_url: "https://swapi.dev/api".to_string(),
            default_city: "Brasília".to_string(),
            page_size: 10,
            insight_window: 50,
            poll_attempts: 5,
            poll_interval_ms: 2000,
            default_days: 3,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "gdash", "gdash-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}
