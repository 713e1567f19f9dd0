//! Identity resolution consumed by the relationship engine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// A resolved participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub handle: String,
}

/// Resolves handles and ids to existing identities.
///
/// `Ok(None)` means the identity does not exist; `Err` is reserved for
/// lookup failures.
#[async_trait]
pub trait IdentityLookup: Send + Sync + std::fmt::Debug {
    async fn resolve_by_handle(&self, handle: &str) -> Result<Option<Identity>>;

    async fn resolve_by_id(&self, id: Uuid) -> Result<Option<Identity>>;
}
