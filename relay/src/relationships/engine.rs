//! Relationship engine
//!
//! State machine over the caller's perspective of a pair:
//!
//! | caller sees | initiate        | accept     | cancel_or_decline | remove_friend |
//! |-------------|-----------------|------------|-------------------|---------------|
//! | none        | create pair     | BadRequest | BadRequest        | BadRequest    |
//! | outgoing    | Conflict        | BadRequest | delete (cancel)   | BadRequest    |
//! | incoming    | friend (auto)   | friend     | delete (decline)  | BadRequest    |
//! | friend      | Conflict        | Conflict   | Conflict          | delete        |
//!
//! The blocked statuses are reserved. `initiate` treats them as corrupt state;
//! the other operations reject them as bad requests.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use super::identity::{Identity, IdentityLookup};
use crate::logging::INTEGRITY_TARGET;
use crate::models::{Relationship, RelationshipStatus};
use crate::storage::errors::StorageError;
use crate::storage::traits::RelationshipStore;
use crate::{RelayError, Result};

/// How a pending request was withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestWithdrawal {
    /// The caller withdrew their own outgoing request
    Cancelled,
    /// The caller turned down an incoming request
    Declined,
}

impl RequestWithdrawal {
    pub fn message(self) -> &'static str {
        match self {
            Self::Cancelled => "Friend request cancelled",
            Self::Declined => "Friend request declined",
        }
    }
}

/// Negotiates friend requests between two identities.
///
/// Holds no mutable state; all coordination happens in the store.
#[derive(Debug, Clone)]
pub struct RelationshipEngine {
    store: Arc<dyn RelationshipStore>,
    identities: Arc<dyn IdentityLookup>,
}

impl RelationshipEngine {
    pub fn new(store: Arc<dyn RelationshipStore>, identities: Arc<dyn IdentityLookup>) -> Self {
        Self { store, identities }
    }

    /// Send a friend request to `target_handle`, or accept theirs if they
    /// already sent one to the caller.
    ///
    /// Returns the caller's row.
    pub async fn initiate(&self, caller: Uuid, target_handle: &str) -> Result<Relationship> {
        let target = self
            .identities
            .resolve_by_handle(target_handle)
            .await?
            .ok_or_else(|| reject(RelayError::NotFound("user not found".to_string())))?;

        if target.id == caller {
            return Err(reject(RelayError::BadRequest(
                "cannot send friend request to self".to_string(),
            )));
        }

        let existing = self.find_pair("initiate", caller, target.id).await?;

        let Some(row) = existing else {
            let created = self
                .store
                .create_pair(caller, target.id)
                .await
                .map_err(|e| storage_failure("initiate", e))?;
            info!(caller = %caller, target = %target.id, "Friend request sent");
            return Ok(created);
        };

        match row.status_for(caller) {
            Some(RelationshipStatus::Friend) => {
                Err(reject(RelayError::Conflict("already friends".to_string())))
            }
            Some(RelationshipStatus::Outgoing) => Err(reject(RelayError::Conflict(
                "friend request already sent".to_string(),
            ))),
            Some(RelationshipStatus::Incoming) => {
                let accepted = self.befriend("initiate", caller, &target).await?;
                info!(caller = %caller, target = %target.id, "Crossed friend requests accepted");
                Ok(accepted)
            }
            observed => Err(unexpected_state("initiate", caller, &row, observed)),
        }
    }

    /// Accept the pending request `other_id` sent to the caller.
    ///
    /// Returns the caller's row.
    pub async fn accept(&self, caller: Uuid, other_id: Uuid) -> Result<Relationship> {
        let other = self.resolve_other("accept", caller, other_id).await?;
        let row = self
            .find_pair("accept", caller, other.id)
            .await?
            .ok_or_else(no_request_found)?;

        match row.status_for(caller) {
            Some(RelationshipStatus::Incoming) => {
                let accepted = self.befriend("accept", caller, &other).await?;
                info!(caller = %caller, other = %other.id, "Friend request accepted");
                Ok(accepted)
            }
            Some(RelationshipStatus::Friend) => {
                Err(reject(RelayError::Conflict("already friends".to_string())))
            }
            Some(RelationshipStatus::Outgoing) => Err(reject(RelayError::BadRequest(
                "cannot accept an outgoing request".to_string(),
            ))),
            _ => Err(reject(RelayError::BadRequest(
                "no pending friend request to accept".to_string(),
            ))),
        }
    }

    /// Withdraw the caller's outgoing request to `other_id`, or decline the
    /// one `other_id` sent. Both rows are removed.
    pub async fn cancel_or_decline(&self, caller: Uuid, other_id: Uuid) -> Result<RequestWithdrawal> {
        let other = self.resolve_other("cancel_or_decline", caller, other_id).await?;
        let row = self
            .find_pair("cancel_or_decline", caller, other.id)
            .await?
            .ok_or_else(no_request_found)?;

        let (observed, withdrawal) = match row.status_for(caller) {
            Some(observed @ RelationshipStatus::Outgoing) => (observed, RequestWithdrawal::Cancelled),
            Some(observed @ RelationshipStatus::Incoming) => (observed, RequestWithdrawal::Declined),
            Some(RelationshipStatus::Friend) => {
                return Err(reject(RelayError::Conflict("already friends".to_string())));
            }
            _ => return Err(no_request_found()),
        };

        // Only the pending request observed above is removed; an accept that
        // landed in between turns this into a Conflict
        self.store
            .delete_pair(caller, other.id, observed)
            .await
            .map_err(|e| storage_failure("cancel_or_decline", e))?;

        info!(caller = %caller, other = %other.id, outcome = ?withdrawal, "Friend request withdrawn");
        Ok(withdrawal)
    }

    /// End a friendship. Both rows are removed.
    pub async fn remove_friend(&self, caller: Uuid, other_id: Uuid) -> Result<()> {
        let other = self.resolve_other("remove_friend", caller, other_id).await?;
        let row = self.find_pair("remove_friend", caller, other.id).await?;

        if row.and_then(|r| r.status_for(caller)) != Some(RelationshipStatus::Friend) {
            return Err(reject(RelayError::BadRequest("not friends".to_string())));
        }

        self.store
            .delete_pair(caller, other.id, RelationshipStatus::Friend)
            .await
            .map_err(|e| storage_failure("remove_friend", e))?;

        info!(caller = %caller, other = %other.id, "Friend removed");
        Ok(())
    }

    /// Every relationship row owned by the caller, oldest first.
    pub async fn list_all(&self, caller: Uuid) -> Result<Vec<Relationship>> {
        self.store
            .list_for_owner(caller)
            .await
            .map_err(|e| storage_failure("list_all", e))
    }

    async fn resolve_other(&self, operation: &str, caller: Uuid, other_id: Uuid) -> Result<Identity> {
        if other_id == caller {
            debug!(operation, caller = %caller, "Rejected self-targeted request");
            return Err(RelayError::BadRequest(
                "cannot target yourself".to_string(),
            ));
        }

        self.identities
            .resolve_by_id(other_id)
            .await?
            .ok_or_else(|| reject(RelayError::NotFound("user not found".to_string())))
    }

    async fn find_pair(
        &self,
        operation: &'static str,
        caller: Uuid,
        other: Uuid,
    ) -> Result<Option<Relationship>> {
        self.store
            .find_pair(caller, other)
            .await
            .map_err(|e| storage_failure(operation, e))
    }

    /// Turn the caller's incoming request into a friendship.
    async fn befriend(
        &self,
        operation: &'static str,
        caller: Uuid,
        other: &Identity,
    ) -> Result<Relationship> {
        self.store
            .set_pair_status(
                caller,
                other.id,
                RelationshipStatus::Incoming,
                RelationshipStatus::Friend,
            )
            .await
            .map_err(|e| storage_failure(operation, e))
    }
}

fn reject(err: RelayError) -> RelayError {
    debug!(reason = %err, "Relationship request rejected");
    err
}

fn no_request_found() -> RelayError {
    reject(RelayError::BadRequest("no friend request found".to_string()))
}

fn unexpected_state(
    operation: &str,
    caller: Uuid,
    row: &Relationship,
    observed: Option<RelationshipStatus>,
) -> RelayError {
    error!(
        target: INTEGRITY_TARGET,
        operation,
        caller = %caller,
        row_id = %row.id,
        row_owner = %row.owner,
        row_status = %row.status,
        observed = ?observed,
        "Unexpected relationship state"
    );
    RelayError::InvariantViolation(format!(
        "unexpected relationship state {} on row {}",
        row.status, row.id
    ))
}

fn storage_failure(operation: &str, err: StorageError) -> RelayError {
    match err {
        StorageError::Integrity(msg) => {
            error!(target: INTEGRITY_TARGET, operation, detail = %msg, "Relationship pair rows disagree");
            RelayError::InvariantViolation(format!("{}: relationship pair corrupt", operation))
        }
        StorageError::AlreadyExists(msg) | StorageError::Conflict(msg) => {
            debug!(operation, detail = %msg, "Lost a concurrent relationship write");
            RelayError::Conflict("relationship was modified concurrently".to_string())
        }
        other => RelayError::from(other),
    }
}
