//! Storage abstractions and implementations
//!
//! This module provides the trait definitions Relay's services depend on and
//! the SurrealDB-backed `SharedStorage` that implements all of them.
//!
//! ## Storage Implementations
//!
//! - **SharedStorage**: embedded SurrealDB, either in memory (tests, demos)
//!   or on disk through RocksDB.

pub mod config;
pub mod errors;
pub mod shared_storage;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use shared_storage::{
    EmbeddedSharedStorage, SharedStorage, SharedStorageConfig, create_embedded_shared_storage,
    create_memory_shared_storage,
};
pub use traits::{BaseStore, ChannelStore, RelationshipStore, SocialStore, UserStore};

/// Create the storage service described by a Relay configuration
///
/// # Arguments
/// * `config` - The Relay configuration
///
/// # Returns
/// A storage service backed by SharedStorage
pub async fn create_storage_service(
    config: &crate::config::RelayConfig,
) -> Result<Box<dyn SocialStore>, StorageError> {
    let surrealdb = &config.storage.surrealdb;
    let shared_config = SharedStorageConfig {
        namespace: surrealdb.namespace.clone(),
        database: surrealdb.database.clone(),
        query_timeout: config.storage.query_timeout,
    };

    shared_storage::create_shared_store(surrealdb, shared_config).await
}
