//! Configuration for shared storage

use std::time::Duration;

/// Configuration for the shared storage
#[derive(Debug, Clone)]
pub struct SharedStorageConfig {
    pub namespace: String,
    pub database: String,
    /// Upper bound on every individual store call
    pub query_timeout: Duration,
}

impl Default for SharedStorageConfig {
    fn default() -> Self {
        Self {
            namespace: "relay".to_string(),
            database: "main".to_string(),
            query_timeout: Duration::from_secs(5),
        }
    }
}
