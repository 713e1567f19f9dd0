//! Shared Storage
//!
//! SurrealDB-backed implementation of every Relay storage trait. One
//! `SharedStorage` handle serves accounts, relationship pairs and channels
//! from a single embedded database, so paired writes can share a transaction.

use surrealdb::Surreal;

use crate::storage::config::{SurrealDBConfig, SurrealDBEngine};
use crate::storage::errors::StorageError;
use crate::storage::traits::SocialStore;

pub mod base;
pub mod channel;
pub mod config;
pub mod relationship;
pub mod schema;
pub mod user;

pub use base::*;
pub use config::*;

/// Type alias for embedded shared storage
pub type EmbeddedSharedStorage = SharedStorage<surrealdb::engine::local::Db>;

/// Create an embedded on-disk shared storage instance
pub async fn create_embedded_shared_storage(
    path: &str,
    config: SharedStorageConfig,
) -> Result<EmbeddedSharedStorage, StorageError> {
    use surrealdb::engine::local::RocksDb;

    let client = Surreal::new::<RocksDb>(path).await.map_err(|e| {
        StorageError::Connection(format!("Failed to create embedded database: {}", e))
    })?;

    SharedStorage::new(client, config).await
}

/// Create an in-memory shared storage instance
pub async fn create_memory_shared_storage(
    config: SharedStorageConfig,
) -> Result<EmbeddedSharedStorage, StorageError> {
    use surrealdb::engine::local::Mem;

    let client = Surreal::new::<Mem>(()).await.map_err(|e| {
        StorageError::Connection(format!("Failed to create memory client: {}", e))
    })?;

    SharedStorage::new(client, config).await
}

/// Create a shared storage instance from a SurrealDB configuration
pub async fn create_shared_store(
    config: &SurrealDBConfig,
    shared_config: SharedStorageConfig,
) -> Result<Box<dyn SocialStore>, StorageError> {
    match config.engine {
        SurrealDBEngine::Memory => {
            tracing::info!("Creating SharedStorage in-memory store");
            let store = create_memory_shared_storage(shared_config).await?;
            Ok(Box::new(store))
        }
        SurrealDBEngine::RocksDB => {
            if config.connection.is_empty() {
                return Err(StorageError::Configuration(
                    "RocksDB engine requires a connection path".to_string(),
                ));
            }
            tracing::info!(
                "Creating SharedStorage RocksDB store at {}",
                config.connection
            );
            let store = create_embedded_shared_storage(&config.connection, shared_config).await?;
            Ok(Box::new(store))
        }
    }
}
