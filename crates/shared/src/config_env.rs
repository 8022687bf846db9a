use std::env;

use crate::config::ConfigError;

pub(crate) fn parse_u64_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_trimmed_env(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::ParseInt(key.to_string())),
        None => Ok(default),
    }
}

pub(crate) fn parse_optional_u64_env(key: &str) -> Result<Option<u64>, ConfigError> {
    optional_trimmed_env(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| ConfigError::ParseInt(key.to_string()))
        })
        .transpose()
}

pub(crate) fn optional_trimmed_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
