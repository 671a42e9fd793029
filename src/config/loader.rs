//! Configuration loading from disk and the process environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", ValidationList(.0))]
    Validation(Vec<ValidationError>),
}

struct ValidationList<'a>(&'a [ValidationError]);

impl fmt::Display for ValidationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Load configuration: defaults, then the optional TOML file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    load_config_with(path, |var| std::env::var(var).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay the documented environment variables onto `config`.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = split_list(&origins);
    }
    if let Some(hosts) = lookup("ALLOWED_TARGET_HOSTS") {
        config.targets.allowed_hosts = split_list(&hosts);
    }
    if let Some(value) = lookup("PORT") {
        config.listener.port = parse_env("PORT", value)?;
    }
    if let Some(value) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = value.trim().to_string();
    }
    if let Some(value) = lookup("UPSTREAM_CONNECT_TIMEOUT_SECS") {
        config.upstream.connect_timeout_secs = parse_env("UPSTREAM_CONNECT_TIMEOUT_SECS", value)?;
    }
    if let Some(value) = lookup("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.response_timeout_secs = parse_env("UPSTREAM_TIMEOUT_SECS", value)?;
    }
    if let Some(value) = lookup("MAX_BODY_BYTES") {
        config.limits.max_body_bytes = parse_env("MAX_BODY_BYTES", value)?;
    }
    if let Some(value) = lookup("INSECURE_SKIP_TLS_VERIFY") {
        config.upstream.danger_accept_invalid_certs = parse_flag("INSECURE_SKIP_TLS_VERIFY", value)?;
    }
    if let Some(value) = lookup("METRICS_ADDRESS") {
        let value = value.trim();
        config.observability.metrics_address = (!value.is_empty()).then(|| value.to_string());
    }
    if let Some(value) = lookup("LOG_LEVEL") {
        config.observability.log_level = value.trim().to_string();
    }
    Ok(())
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

fn parse_env<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Env {
        var,
        reason: e.to_string(),
        value,
    })
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            value,
            reason: "expected true or false".into(),
        }),
    }
}
