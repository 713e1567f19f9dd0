//! Configuration validation utilities.

use super::ConfigError;
use super::models::*;
use crate::storage::config::SurrealDBEngine;

/// Validate the entire configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), ConfigError> {
    validate_storage_config(&config.storage)
}

/// Validate storage configuration.
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Data directory cannot be empty".to_string(),
        ));
    }

    if config.surrealdb.namespace.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "SurrealDB namespace cannot be empty".to_string(),
        ));
    }
    if config.surrealdb.database.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "SurrealDB database cannot be empty".to_string(),
        ));
    }

    if config.surrealdb.engine == SurrealDBEngine::RocksDB
        && config.surrealdb.connection.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "RocksDB engine requires a connection path".to_string(),
        ));
    }

    if config.query_timeout.is_zero() {
        return Err(ConfigError::ValidationError(
            "Storage query timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
