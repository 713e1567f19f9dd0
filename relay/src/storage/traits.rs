//! Trait definitions for storage components in Relay

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use crate::models::{Channel, ChannelMember, NewUser, Relationship, RelationshipStatus, User};
use crate::storage::errors::StorageError;

/// Base trait for all storage implementations
#[async_trait]
pub trait BaseStore: Send + Sync + 'static + Debug {
    /// Check if the store is healthy and available
    async fn health_check(&self) -> Result<bool, StorageError>;

    /// Clear all data in the store
    async fn clear(&self) -> Result<(), StorageError>;

    /// Get metadata about the store
    async fn get_metadata(&self) -> Result<serde_json::Value, StorageError>;

    /// Close connections and release resources
    async fn close(&self) -> Result<(), StorageError>;
}

/// Trait for account operations
#[async_trait]
pub trait UserStore: BaseStore {
    /// Create an account. Fails with `AlreadyExists` when the username or
    /// email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Get an account by its ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError>;

    /// Get an account by its exact username
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Get an account by its email address
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
}

/// Trait for relationship pair operations.
///
/// A logical relationship is two rows, one per participant. Implementations
/// only ever write both rows together, inside one transaction.
#[async_trait]
pub trait RelationshipStore: BaseStore {
    /// Find the row linking `a` and `b`, in either direction.
    ///
    /// Prefers the row owned by `a`; the mirror is returned only when `a`'s
    /// row is missing. Callers must inspect `owner` to learn whose
    /// perspective they received.
    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Relationship>, StorageError>;

    /// Insert `a -> b` as `outgoing` and `b -> a` as `incoming`.
    ///
    /// Fails with `AlreadyExists` (nothing inserted) when either row exists.
    /// Returns `a`'s row.
    async fn create_pair(&self, a: Uuid, b: Uuid) -> Result<Relationship, StorageError>;

    /// Set `a`'s row to `status` and `b`'s row to its complement, provided
    /// `a`'s row still holds `expected`.
    ///
    /// Nothing is written on failure. Fails with `Conflict` when neither row
    /// exists or `a`'s row no longer holds `expected`, and with `Integrity`
    /// when only one row exists or the two disagree. Returns `a`'s row as
    /// written.
    async fn set_pair_status(
        &self,
        a: Uuid,
        b: Uuid,
        expected: RelationshipStatus,
        status: RelationshipStatus,
    ) -> Result<Relationship, StorageError>;

    /// Delete both rows, provided `a`'s row still holds `expected`.
    ///
    /// Fails like `set_pair_status`, deleting nothing.
    async fn delete_pair(
        &self,
        a: Uuid,
        b: Uuid,
        expected: RelationshipStatus,
    ) -> Result<(), StorageError>;

    /// All rows owned by `owner`, oldest first.
    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Relationship>, StorageError>;
}

/// Trait for channel operations
#[async_trait]
pub trait ChannelStore: BaseStore {
    /// Find the DM channel between two accounts
    async fn find_dm(&self, a: Uuid, b: Uuid) -> Result<Option<Channel>, StorageError>;

    /// Create the DM channel between two accounts together with both
    /// memberships. Fails with `AlreadyExists` if one already exists.
    async fn create_dm(&self, a: Uuid, b: Uuid) -> Result<Channel, StorageError>;

    /// Create a group channel and all memberships in one transaction
    async fn create_group(
        &self,
        owner: Uuid,
        name: &str,
        members: &[Uuid],
    ) -> Result<Channel, StorageError>;

    /// Channels `member` belongs to, oldest first
    async fn list_channels_for(&self, member: Uuid) -> Result<Vec<Channel>, StorageError>;

    /// Memberships of a channel, in join order
    async fn list_members(&self, channel: Uuid) -> Result<Vec<ChannelMember>, StorageError>;
}

/// Everything Relay persists, behind one handle
pub trait SocialStore: UserStore + RelationshipStore + ChannelStore {}

impl<T> SocialStore for T where T: UserStore + RelationshipStore + ChannelStore {}
