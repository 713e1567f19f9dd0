//! Domain models for accounts, relationships, and channels

pub mod channel;
pub mod relationship;
pub mod user;

// Re-export important models
pub use channel::{Channel, ChannelKind, ChannelMember, dm_key};
pub use relationship::{Relationship, RelationshipStatus};
pub use user::{NewUser, User};
