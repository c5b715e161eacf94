//! Service configuration from the environment

use tasks_cache::{CacheConfig, CacheError};
use thiserror::Error;
use tracing::{debug, warn};

pub const HOST_ENV_VAR: &str = "HOST";
pub const PORT_ENV_VAR: &str = "PORT";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid cache configuration: {0}")]
    Cache(#[from] CacheError),
}

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
    pub cache: CacheConfig,
}

impl ApiServerConfig {
    /// Read `HOST`, `PORT` and the cache variables.
    ///
    /// Call [`load_dotenv`] first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var(HOST_ENV_VAR).ok();
        let port = std::env::var(PORT_ENV_VAR).ok();
        Self::from_values(host.as_deref(), port.as_deref(), CacheConfig::from_env())
    }

    pub fn from_values(
        host: Option<&str>,
        port: Option<&str>,
        cache: CacheConfig,
    ) -> Result<Self, ConfigError> {
        let port = match port.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: PORT_ENV_VAR,
                value: raw.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            host: host
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .unwrap_or(DEFAULT_HOST)
                .to_string(),
            port,
            cache,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load `.env` from the working directory or its parents, if present
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}
