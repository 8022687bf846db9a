use std::net::SocketAddr;

use thiserror::Error;

use crate::config_env::{optional_trimmed_env, parse_u64_env};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_bind_addr =
            optional_trimmed_env("API_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind_addr.parse::<SocketAddr>().map_err(|_| {
            ConfigError::InvalidConfiguration(format!(
                "API_BIND_ADDR must be a socket address, got '{raw_bind_addr}'"
            ))
        })?;

        let max_body_bytes = parse_u64_env("API_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        if max_body_bytes == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "API_MAX_BODY_BYTES must be greater than zero".to_string(),
            ));
        }
        let max_body_bytes = usize::try_from(max_body_bytes).map_err(|_| {
            ConfigError::InvalidConfiguration("API_MAX_BODY_BYTES is too large".to_string())
        })?;

        Ok(Self {
            bind_addr,
            max_body_bytes,
        })
    }
}

impl LogFormat {
    pub fn from_env() -> Result<Self, ConfigError> {
        match optional_trimmed_env("LOG_FORMAT")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("text") => Ok(Self::Text),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(ConfigError::InvalidConfiguration(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Loads `.env` from the working directory if present. A missing file is not
/// an error.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}
