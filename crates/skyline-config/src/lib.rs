//! Skyline provider configuration
//!
//! Settings come from a YAML file, then environment variables override
//! individual fields. A missing file is not an error; missing credentials
//! are reported only by the service that needs them.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file directly
pub const CONFIG_PATH_ENV: &str = "SKYLINE_CONFIG_PATH";

/// Config file name looked up in the current and global config directories
pub const CONFIG_FILE_NAME: &str = "skyline.yaml";

pub const DEFAULT_REGION: &str = "us-south";
pub const DEFAULT_SOFTLAYER_ENDPOINT: &str = "https://api.softlayer.com/rest/v3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: String,
    pub softlayer: SoftLayerSettings,
    pub bluemix: BluemixSettings,
    pub openwhisk: OpenWhiskSettings,
    /// Retries for transient API failures
    pub retry_count: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            softlayer: SoftLayerSettings::default(),
            bluemix: BluemixSettings::default(),
            openwhisk: OpenWhiskSettings::default(),
            retry_count: 10,
            retry_delay_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftLayerSettings {
    pub username: String,
    pub api_key: String,
    pub endpoint_url: String,
    pub timeout_secs: u64,
}

impl Default for SoftLayerSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_key: String::new(),
            endpoint_url: DEFAULT_SOFTLAYER_ENDPOINT.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluemixSettings {
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for BluemixSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWhiskSettings {
    /// API host; derived from the region when empty
    pub host: String,
    /// `uuid:key`; looked up with the Bluemix API key when empty
    pub auth_key: String,
    pub namespace: String,
}

/// How to authenticate against OpenWhisk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhiskCredentials {
    AuthKey(String),
    ApiKey(String),
}

impl Config {
    /// Load from the discovered config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Override fields from `SL_*`, `BM_*` and `OW_*` variables
    pub fn apply_env(&mut self) -> Result<()> {
        let overrides: [(&str, &mut String); 8] = [
            ("SL_USERNAME", &mut self.softlayer.username),
            ("SL_API_KEY", &mut self.softlayer.api_key),
            ("SL_ENDPOINT_URL", &mut self.softlayer.endpoint_url),
            ("BM_API_KEY", &mut self.bluemix.api_key),
            ("BM_REGION", &mut self.region),
            ("OW_HOST", &mut self.openwhisk.host),
            ("OW_AUTH_KEY", &mut self.openwhisk.auth_key),
            ("OW_NAMESPACE", &mut self.openwhisk.namespace),
        ];
        for (key, field) in overrides {
            if let Some(value) = env_value(key) {
                *field = value;
            }
        }

        if let Some(value) = env_value("SL_TIMEOUT") {
            self.softlayer.timeout_secs = parse_number("SL_TIMEOUT", &value)?;
        }
        if let Some(value) = env_value("BM_TIMEOUT") {
            self.bluemix.timeout_secs = parse_number("BM_TIMEOUT", &value)?;
        }
        Ok(())
    }

    /// Username and API key for the ordering API
    pub fn softlayer_credentials(&self) -> Result<(&str, &str)> {
        if self.softlayer.username.is_empty() || self.softlayer.api_key.is_empty() {
            return Err(ConfigError::MissingSoftLayerCredentials);
        }
        Ok((&self.softlayer.username, &self.softlayer.api_key))
    }

    /// A configured auth key wins over an API key lookup
    pub fn whisk_credentials(&self) -> Result<WhiskCredentials> {
        if !self.openwhisk.auth_key.is_empty() {
            Ok(WhiskCredentials::AuthKey(self.openwhisk.auth_key.clone()))
        } else if !self.bluemix.api_key.is_empty() {
            Ok(WhiskCredentials::ApiKey(self.bluemix.api_key.clone()))
        } else {
            Err(ConfigError::MissingWhiskCredentials)
        }
    }

    pub fn softlayer_timeout(&self) -> Duration {
        Duration::from_secs(self.softlayer.timeout_secs)
    }

    pub fn bluemix_timeout(&self) -> Duration {
        Duration::from_secs(self.bluemix.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Global config directory (`~/.config/skyline`)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("skyline"))
}

/// Locate the config file
///
/// Search order:
/// 1. `SKYLINE_CONFIG_PATH`
/// 2. `./skyline.yaml`
/// 3. `~/.config/skyline/config.yaml`
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = env_value(CONFIG_PATH_ENV).map(PathBuf::from) {
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "{} points to a missing file", CONFIG_PATH_ENV);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let local = current_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
    }

    let global = get_config_dir().ok()?.join("config.yaml");
    global.exists().then_some(global)
}
