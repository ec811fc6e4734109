//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0)
//! - Reject credentials that cannot travel in an HTTP header
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid gateway base_url '{0}'")]
    InvalidGatewayUrl(String),

    #[error("gateway me_path must start with '/'")]
    InvalidMePath,

    #[error("gateway admin_token contains characters not allowed in a header")]
    InvalidAdminToken,

    #[error("cors {0} is not a valid header value")]
    InvalidCorsValue(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match url::Url::parse(&config.gateway.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidGatewayUrl(
            config.gateway.base_url.clone(),
        )),
    }

    if !config.gateway.me_path.starts_with('/') {
        errors.push(ValidationError::InvalidMePath);
    }

    if !config.gateway.admin_token.is_empty()
        && HeaderValue::from_str(&format!("Bearer {}", config.gateway.admin_token)).is_err()
    {
        errors.push(ValidationError::InvalidAdminToken);
    }

    for (name, value) in [
        ("allow_origin", &config.cors.allow_origin),
        ("allow_methods", &config.cors.allow_methods),
        ("allow_headers", &config.cors.allow_headers),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidCorsValue(name));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    if config.gateway.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("gateway.timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
