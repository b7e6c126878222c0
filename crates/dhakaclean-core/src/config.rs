use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dhakaclean_gateway::GatewayConfig;
use dhakaclean_provider::{ProviderConfig, ProviderType};
use dhakaclean_schema::GeolocationSample;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::{FixedLocation, LocationProvider, NoLocation};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse yaml file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            server: ServerConfig::default(),
            location: LocationConfig::default(),
            log_dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Position used when the host has no positioning of its own
    #[serde(default)]
    pub fixed: Option<GeolocationSample>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            fixed: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl AppConfig {
    /// Read `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => read_yaml_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.model must not be empty".into()));
        }
        if self.location.timeout_ms == 0 {
            return Err(ConfigError::Invalid("location.timeout_ms must be positive".into()));
        }
        if let Some(fixed) = self.location.fixed {
            if !(-90.0..=90.0).contains(&fixed.latitude)
                || !(-180.0..=180.0).contains(&fixed.longitude)
            {
                return Err(ConfigError::Invalid(format!(
                    "location.fixed out of range: {}, {}",
                    fixed.latitude, fixed.longitude
                )));
            }
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::default().with_model(&self.provider.model)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location.timeout_ms)
    }

    pub fn default_locator(&self) -> Arc<dyn LocationProvider> {
        match self.location.fixed {
            Some(sample) => Arc::new(FixedLocation(sample)),
            None => Arc::new(NoLocation),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.provider.provider_type == ProviderType::Stub
            || self.provider.resolve_api_key().is_some()
    }
}

fn read_yaml_file<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
