//! Relay Manager
//!
//! The primary entry point into Relay. Wires the account directory, the
//! relationship engine and the channel manager over one storage handle.

use std::sync::Arc;

use crate::accounts::AccountDirectory;
use crate::channels::ChannelManager;
use crate::config::RelayConfig;
use crate::relationships::{IdentityLookup, RelationshipEngine};
use crate::storage::traits::{BaseStore, ChannelStore, RelationshipStore, SocialStore, UserStore};
use crate::Result;

/// Orchestrates Relay's services.
///
/// Every component receives its collaborators at construction; there is no
/// global state.
#[derive(Debug, Clone)]
pub struct RelayManager {
    storage: Arc<dyn SocialStore>,
    accounts: Arc<AccountDirectory>,
    relationships: RelationshipEngine,
    channels: ChannelManager,
    config: RelayConfig,
}

impl RelayManager {
    /// Create a new manager over the provided storage
    pub fn new(storage: Arc<dyn SocialStore>, config: RelayConfig) -> Self {
        let users: Arc<dyn UserStore> = storage.clone();
        let pairs: Arc<dyn RelationshipStore> = storage.clone();
        let channel_store: Arc<dyn ChannelStore> = storage.clone();

        let accounts = Arc::new(AccountDirectory::new(users));
        let identities: Arc<dyn IdentityLookup> = accounts.clone();

        let relationships = RelationshipEngine::new(pairs, Arc::clone(&identities));
        let channels = ChannelManager::new(channel_store, identities);

        Self {
            storage,
            accounts,
            relationships,
            channels,
            config,
        }
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn relationships(&self) -> &RelationshipEngine {
        &self.relationships
    }

    pub fn channels(&self) -> &ChannelManager {
        &self.channels
    }

    /// Get access to the underlying storage
    pub fn storage(&self) -> &Arc<dyn SocialStore> {
        &self.storage
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Check that the storage backend answers
    pub async fn health_check(&self) -> Result<bool> {
        Ok(self.storage.health_check().await?)
    }
}
