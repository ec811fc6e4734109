//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional) + config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to the server and gateway client at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_env_file, resolve_config, ConfigError};
pub use schema::{
    AppConfig, CorsConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    TimeoutConfig, WebappConfig,
};
pub use validation::ValidationError;
