//! Service configuration
//!
//! Settings come from an optional TOML file, then environment variables
//! (optionally loaded from `.env`) override the API credentials and a few
//! tunables. Every field has a default so an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::bitcoin::COINGECKO_BASE_URL;
use crate::data::currency::EXCHANGE_RATE_BASE_URL;
use crate::data::weather::OPEN_WEATHER_BASE_URL;
use crate::service::DEFAULT_TTL_SECONDS;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "climapyg.toml";

/// Upper bound for `weather.cache_ttl_seconds` (one year)
pub const MAX_CACHE_TTL_SECONDS: i64 = 365 * 24 * 3600;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub exchange: ExchangeConfig,

    #[serde(default)]
    pub coingecko: CoinGeckoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix for versioned routes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

/// Which snapshot store backs the weather cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Root directory for the file store; platform data dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// How long a cached snapshot is served before it is refreshed
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: i64,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_exchange_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinGeckoConfig {
    #[serde(default = "default_coingecko_url")]
    pub base_url: String,

    /// Demo API key; requests are sent without one when empty
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_project_name() -> String {
    "ClimaPYG".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::File
}

fn default_weather_url() -> String {
    OPEN_WEATHER_BASE_URL.to_string()
}

fn default_exchange_url() -> String {
    EXCHANGE_RATE_BASE_URL.to_string()
}

fn default_cache_ttl_seconds() -> i64 {
    DEFAULT_TTL_SECONDS
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_coingecko_url() -> String {
    COINGECKO_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            weather: WeatherConfig::default(),
            exchange: ExchangeConfig::default(),
            coingecko: CoinGeckoConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            data_dir: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            api_key: String::new(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_url(),
            api_key: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: default_coingecko_url(),
            api_key: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl WeatherConfig {
    /// Saturates at `chrono::Duration::MAX` for values `validate` rejects
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.cache_ttl_seconds).unwrap_or(chrono::Duration::MAX)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CoinGeckoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ServerConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    /// Parses settings from TOML text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Loads settings the way the server does at startup
    ///
    /// An explicit `path` must exist. Without one, `climapyg.toml` in the
    /// working directory is used if present, otherwise defaults apply.
    /// `.env` is loaded, then environment overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        // A missing .env is fine
        let _ = dotenvy::dotenv();
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;

        Ok(settings)
    }

    /// Applies environment overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENWEATHERMAP_API_KEY") {
            self.weather.api_key = key;
        }
        if let Some(key) = lookup("EXCHANGE_RATE_API_KEY") {
            self.exchange.api_key = key;
        }
        if let Some(key) = lookup("COINGECKO_API_KEY") {
            self.coingecko.api_key = key;
        }
        if let Some(ttl) = lookup("WEATHER_CACHE_TTL_SECONDS") {
            self.weather.cache_ttl_seconds =
                ttl.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "WEATHER_CACHE_TTL_SECONDS",
                    reason: format!("'{}' is not an integer", ttl),
                })?;
        }
        if let Some(port) = lookup("CLIMAPYG_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "CLIMAPYG_PORT",
                reason: format!("'{}' is not a valid port", port),
            })?;
        }
        Ok(())
    }

    /// Checks invariants serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CACHE_TTL_SECONDS).contains(&self.weather.cache_ttl_seconds) {
            return Err(ConfigError::Invalid {
                key: "weather.cache_ttl_seconds",
                reason: format!("must be between 1 and {}", MAX_CACHE_TTL_SECONDS),
            });
        }
        let timeouts = [
            ("weather.timeout_seconds", self.weather.timeout_seconds),
            ("exchange.timeout_seconds", self.exchange.timeout_seconds),
            ("coingecko.timeout_seconds", self.coingecko.timeout_seconds),
        ];
        for (key, seconds) in timeouts {
            if seconds == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        let prefix = &self.server.api_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            return Err(ConfigError::Invalid {
                key: "server.api_prefix",
                reason: "must start with '/' and name a path segment, e.g. /api/v1".to_string(),
            });
        }
        Ok(())
    }
}
