//! Environment-driven gateway configuration.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the gateway binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Listen address.
    pub bind_addr: String,
    /// Listen port.
    pub port: u16,
    /// `PostgreSQL` URL; `None` selects the in-memory registry.
    pub database_url: Option<String>,
    /// Connection pool size for the `PostgreSQL` registry.
    pub database_pool_size: u32,
    /// Bound applied to every backend call.
    pub backend_timeout: Duration,
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable held a value that does not parse.
    #[error("{variable} must be {expected}, got '{value}'")]
    Invalid {
        /// Variable name.
        variable: &'static str,
        /// Human-readable expectation.
        expected: &'static str,
        /// Offending value.
        value: String,
    },
    /// Bind address and port do not form a socket address.
    #[error("invalid bind address '{0}'")]
    InvalidSocket(String),
}

impl GatewayConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let config = Self {
            bind_addr: read("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            port: parse_or(read("PORT"), "PORT", "a port number", DEFAULT_PORT)?,
            database_url: read("DATABASE_URL"),
            database_pool_size: parse_or(
                read("DATABASE_POOL_SIZE"),
                "DATABASE_POOL_SIZE",
                "a positive integer",
                DEFAULT_POOL_SIZE,
            )?,
            backend_timeout: Duration::from_secs(parse_or(
                read("BACKEND_TIMEOUT_SECS"),
                "BACKEND_TIMEOUT_SECS",
                "a positive number of seconds",
                DEFAULT_BACKEND_TIMEOUT_SECS,
            )?),
        };

        if config.database_pool_size == 0 {
            return Err(ConfigError::Invalid {
                variable: "DATABASE_POOL_SIZE",
                expected: "a positive integer",
                value: "0".to_owned(),
            });
        }
        if config.backend_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                variable: "BACKEND_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".to_owned(),
            });
        }
        config.bind_socket()?;
        Ok(config)
    }

    /// Returns the socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSocket`] for an unparsable address.
    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.bind_addr, self.port);
        raw.parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket(raw))
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    variable: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    raw.map_or(Ok(default), |value| {
        value.parse::<T>().map_err(|_| ConfigError::Invalid {
            variable,
            expected,
            value,
        })
    })
}
