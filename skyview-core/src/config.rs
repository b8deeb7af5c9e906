use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "SKYVIEW_API_KEY";

/// Which calendar decides where one forecast day ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// The time zone of the machine running the client.
    #[default]
    Local,
    /// The fixed UTC offset reported for the queried location.
    Location,
}

/// Tuning for the suggestion search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub debounce_ms: u64,
    pub limit: usize,
    pub min_query_len: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { debounce_ms: 300, limit: 5, min_query_len: 2 }
    }
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Provider endpoints. Overridable so tests can point at a local server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub api_base: String,
    pub icon_base: String,
    pub timeout_secs: u64,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: "https://api.openweathermap.org".to_string(),
            icon_base: "https://openweathermap.org/img/wn".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// day_boundary = "local"
///
/// [home]
/// latitude = 51.5
/// longitude = -0.12
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub day_boundary: DayBoundary,
    /// Coordinates used when no location is given on the command line.
    pub home: Option<Coordinates>,
    pub search: SearchSettings,
    pub endpoints: Endpoints,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the stored one.
    pub fn api_key(&self) -> Result<String> {
        self.resolve_api_key(Self::env_api_key())
    }

    pub(crate) fn env_api_key() -> Option<String> {
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
    }

    /// Pick the key from `from_env` first, then from the stored config.
    pub(crate) fn resolve_api_key(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `skyview configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoints.timeout_secs)
    }
}
