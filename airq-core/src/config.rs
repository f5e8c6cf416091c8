use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "API_KEY";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "AIRQ_CONFIG";

pub const DEFAULT_GEOCODING_URL: &str = "http://api.openweathermap.org/geo/1.0/direct";
pub const DEFAULT_POLLUTION_URL: &str = "http://api.openweathermap.org/data/2.5/air_pollution";

/// Upstream endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geocoding: String,
    pub pollution: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: DEFAULT_GEOCODING_URL.to_string(),
            pollution: DEFAULT_POLLUTION_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Geocoding retry schedule: `attempts` tries in total, sleeping
/// `base_delay_ms * 2^(n-2)` before try `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 5, base_delay_ms: 1000 }
    }
}

impl RetryPolicy {
    /// Sleep before the 1-based `attempt`. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u64.checked_shl(attempt - 2).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Top-level configuration, optionally read from disk.
///
/// Example TOML:
/// [endpoints]
/// geocoding = "http://localhost:8080/geo"
///
/// [retry]
/// attempts = 3
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: Endpoints,
    pub http: HttpConfig,
    pub retry: RetryPolicy,
}

impl Config {
    /// Load config from disk, or return defaults if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid values in config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.http.timeout_secs > 0, "http.timeout_secs must be greater than zero");
        ensure!(self.retry.attempts >= 1, "retry.attempts must be at least 1");
        ensure!(!self.endpoints.geocoding.is_empty(), "endpoints.geocoding must not be empty");
        ensure!(!self.endpoints.pollution.is_empty(), "endpoints.pollution must not be empty");
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Path to the config file, honouring `AIRQ_CONFIG`.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "airq", "airq")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
