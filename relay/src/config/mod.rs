//! Configuration system for Relay.
//!
//! Configuration is layered: built-in defaults, then an optional file, then
//! `RELAY_`-prefixed environment variables, validated once at the end.

mod builder;
mod loader;
mod models;
#[cfg(test)]
mod tests;
mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;
pub use validation::validate_config;

/// Default configuration file names that the system will look for
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "relay.toml",
    "relay.yaml",
    "relay.yml",
    "relay.json",
    ".relay/config.toml",
    ".relay/config.yaml",
    ".relay/config.yml",
    ".relay/config.json",
];

/// Environment variable prefix for Relay configuration
pub const ENV_PREFIX: &str = "RELAY_";

/// Separator for nested keys in environment variables,
/// e.g. `RELAY_STORAGE__QUERY_TIMEOUT`
pub const ENV_NESTING: &str = "__";

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred during file loading
    #[error("Failed to load configuration file: {0}")]
    FileLoadError(String),

    /// Error occurred during environment loading
    #[error("Failed to load environment variables: {0}")]
    EnvLoadError(String),

    /// Error occurred during validation
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Error occurred during parsing
    #[error("Configuration parsing error: {0}")]
    ParseError(String),

    /// General error
    #[error("{0}")]
    Other(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
