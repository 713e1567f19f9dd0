//! Friend-request negotiation
//!
//! Every logical relationship is stored as two mirrored rows. The
//! [`RelationshipEngine`] decides each transition from a single row read and
//! delegates every two-row write to the [`RelationshipStore`] contract.
//!
//! [`RelationshipStore`]: crate::storage::traits::RelationshipStore

pub mod engine;
pub mod identity;

pub use engine::{RelationshipEngine, RequestWithdrawal};
pub use identity::{Identity, IdentityLookup};
