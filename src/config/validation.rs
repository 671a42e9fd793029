//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must list at least one entry (use \"*\" to allow any)")]
    EmptyAllowList(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid listener address '{0}'")]
    ListenerAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !has_entries(&config.cors.allowed_origins) {
        errors.push(ValidationError::EmptyAllowList("cors.allowed_origins"));
    }
    if !has_entries(&config.targets.allowed_hosts) {
        errors.push(ValidationError::EmptyAllowList("targets.allowed_hosts"));
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.response_timeout_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    let listener_addr = config.listener.socket_address();
    if listener_addr.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::ListenerAddress(listener_addr));
    }

    if let Some(metrics_addr) = &config.observability.metrics_address {
        if metrics_addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(metrics_addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_entries(list: &[String]) -> bool {
    list.iter().any(|entry| !entry.trim().is_empty())
}
