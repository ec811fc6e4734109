//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND: &str = "SESSION_RELAY_BIND";
/// Environment variable overriding `gateway.base_url`.
pub const ENV_GATEWAY_URL: &str = "GATEWAY_URL";
/// Environment variable overriding `gateway.admin_token`.
pub const ENV_ADMIN_TOKEN: &str = "ADMIN_TOKEN";
/// Environment variable overriding `webapp.dir`.
pub const ENV_WEBAPP_DIR: &str = "WEBAPP_DIR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `KEY=value` lines from an env file into the process environment.
///
/// Variables already set in the environment keep their values. Returns false
/// when the file is missing or unreadable.
pub fn load_env_file(path: &Path) -> bool {
    dotenvy::from_path(path).is_ok()
}

/// Resolve the runtime configuration: file (or defaults), then process
/// environment overrides, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay values from `lookup` onto `config`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(bind) = get(ENV_BIND) {
        config.listener.bind_address = bind;
    }
    if let Some(url) = get(ENV_GATEWAY_URL) {
        config.gateway.base_url = url;
    }
    if let Some(token) = get(ENV_ADMIN_TOKEN) {
        config.gateway.admin_token = token;
    }
    if let Some(dir) = get(ENV_WEBAPP_DIR) {
        config.webapp.dir = dir;
    }
}
