//! # Relay
//!
//! Social-graph backend for a chat application: accounts, a friend-request
//! negotiation engine over mirrored relationship rows, and DM/group channels.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConfigBuilder::development().build()?;
//!     let relay = relay::init(config).await?;
//!
//!     let alice = relay
//!         .accounts()
//!         .register(NewAccount::new("alice", "alice@example.com", "<bcrypt hash>"))
//!         .await?;
//!     let bob = relay
//!         .accounts()
//!         .register(NewAccount::new("bob", "bob@example.com", "<bcrypt hash>"))
//!         .await?;
//!
//!     // Alice asks, Bob asks back: the second call accepts instead of duplicating
//!     relay.relationships().initiate(alice.id, "bob").await?;
//!     let view = relay.relationships().initiate(bob.id, "alice").await?;
//!     assert_eq!(view.status, RelationshipStatus::Friend);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **storage**: store traits plus the SurrealDB-backed `SharedStorage`;
//!   every two-row mutation runs in a single transaction
//! - **relationships**: `RelationshipEngine`, the friend-request state machine
//! - **accounts**: `AccountDirectory`, which also resolves identities for the engine
//! - **channels**: `ChannelManager` for DM and group channels
//! - **core**: `RelayManager`, wiring everything from one configuration

pub mod accounts;
pub mod channels;
pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod relationships;
pub mod storage;

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::init;

    pub use crate::config::{ConfigBuilder, ConfigLoader, LogLevel, RelayConfig, StorageConfig};

    pub use crate::models::{
        Channel, ChannelKind, ChannelMember, Relationship, RelationshipStatus, User,
    };

    pub use crate::accounts::{AccountDirectory, NewAccount};
    pub use crate::channels::{ChannelManager, GroupChannel};
    pub use crate::core::RelayManager;
    pub use crate::relationships::{
        Identity, IdentityLookup, RelationshipEngine, RequestWithdrawal,
    };

    pub use crate::storage::StorageError;

    pub use crate::{RelayError, Result};
}

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for Relay operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The target identity or relationship does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is malformed or invalid for the current state
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate request, already-established state, or a lost uniqueness race
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored state that the relationship invariants make unreachable
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Storage timeout or connectivity failure; safe to retry
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    /// Error during storage operations
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Logging error
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LogError),

    /// Other unclassified errors
    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::Infrastructure(_))
    }
}

impl From<crate::config::ConfigError> for RelayError {
    fn from(err: crate::config::ConfigError) -> Self {
        RelayError::Configuration(err.to_string())
    }
}

impl From<storage::StorageError> for RelayError {
    fn from(err: storage::StorageError) -> Self {
        use storage::StorageError;

        match err {
            StorageError::AlreadyExists(msg) | StorageError::Conflict(msg) => {
                RelayError::Conflict(msg)
            }
            StorageError::Timeout(_) | StorageError::Connection(_) => {
                RelayError::Infrastructure(err.to_string())
            }
            StorageError::Integrity(msg) => RelayError::InvariantViolation(msg),
            StorageError::NotFound(msg) => RelayError::NotFound(msg),
            StorageError::Validation(msg) => RelayError::BadRequest(msg),
            other => RelayError::Storage(other.to_string()),
        }
    }
}

/// Result type for Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Initialize Relay with the provided configuration
///
/// Sets up logging, opens the configured storage backend and wires the
/// account, relationship and channel services on top of it.
///
/// # Arguments
/// * `config` - The configuration for initializing Relay
///
/// # Returns
/// A `RelayManager` instance if initialization succeeds
pub async fn init(config: config::RelayConfig) -> Result<core::RelayManager> {
    // A host application may already own the global subscriber
    if let Err(e) = logging::init(&config.logging) {
        tracing::debug!("Logging initialization skipped: {}", e);
    }

    tracing::info!(
        engine = ?config.storage.surrealdb.engine,
        namespace = %config.storage.surrealdb.namespace,
        "Opening Relay storage"
    );

    let storage = storage::create_storage_service(&config).await?;
    let storage = std::sync::Arc::from(storage);

    Ok(core::RelayManager::new(storage, config))
}
