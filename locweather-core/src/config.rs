use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    coordinates::{CommandCoordinateProvider, DEFAULT_LOCATE_COMMAND, RoundingPolicy},
    history::{HistoryFormat, WeatherStorage},
    provider::ProviderId,
};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// How coordinates are obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    /// Positioning command and its arguments.
    pub command: Vec<String>,

    /// Round coordinates to one decimal place before they are used.
    pub use_rounded_coords: bool,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self { command: vec![DEFAULT_LOCATE_COMMAND.to_string()], use_rounded_coords: true }
    }
}

/// Where and how weather history is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub format: HistoryFormat,

    /// Defaults to `history.json` / `history.txt` in the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub gps: GpsConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            providers: HashMap::new(),
            gps: GpsConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `locweather configure <provider>` (e.g. `locweather configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from `path`, or defaults if the file doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
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
        let dirs = ProjectDirs::from("dev", "locweather", "locweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .and_modify(|cfg| cfg.api_key = api_key.clone())
            .or_insert(ProviderConfig { api_key, base_url: None });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn rounding_policy(&self) -> RoundingPolicy {
        RoundingPolicy::from(self.gps.use_rounded_coords)
    }

    /// Coordinate provider running the configured positioning command.
    pub fn coordinate_provider(&self) -> Result<CommandCoordinateProvider> {
        CommandCoordinateProvider::from_command_line(&self.gps.command, self.rounding_policy())
            .context("Invalid [gps] command in configuration")
    }

    /// History file path, resolving the default against the working directory.
    pub fn history_path(&self) -> Result<PathBuf> {
        match &self.history.path {
            Some(path) => Ok(path.clone()),
            None => {
                let cwd = std::env::current_dir()
                    .context("Failed to determine current directory for history file")?;
                Ok(cwd.join(self.history.format.default_file_name()))
            }
        }
    }

    /// Storage backend for the configured history format.
    pub fn history_storage(&self) -> Result<Box<dyn WeatherStorage>> {
        Ok(self.history.format.storage(self.history_path()?))
    }
}
