//! Channel management

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Channel, ChannelMember};
use crate::relationships::IdentityLookup;
use crate::storage::errors::StorageError;
use crate::storage::traits::ChannelStore;
use crate::{RelayError, Result};

pub const GROUP_NAME_MIN_LEN: usize = 3;
pub const GROUP_NAME_MAX_LEN: usize = 50;

/// A freshly created group channel with its members, owner first.
#[derive(Debug, Clone, Serialize)]
pub struct GroupChannel {
    pub channel: Channel,
    pub member_ids: Vec<Uuid>,
}

/// Opens direct-message channels and creates group channels.
#[derive(Debug, Clone)]
pub struct ChannelManager {
    store: Arc<dyn ChannelStore>,
    identities: Arc<dyn IdentityLookup>,
}

impl ChannelManager {
    pub fn new(store: Arc<dyn ChannelStore>, identities: Arc<dyn IdentityLookup>) -> Self {
        Self { store, identities }
    }

    /// Return the DM channel between `caller` and `target`, creating it on
    /// first use.
    pub async fn get_or_create_dm(&self, caller: Uuid, target: Uuid) -> Result<Channel> {
        if caller == target {
            return Err(RelayError::BadRequest(
                "cannot open a direct message with yourself".to_string(),
            ));
        }

        self.identities
            .resolve_by_id(target)
            .await?
            .ok_or_else(|| RelayError::NotFound("user not found".to_string()))?;

        if let Some(existing) = self.store.find_dm(caller, target).await? {
            return Ok(existing);
        }

        match self.store.create_dm(caller, target).await {
            Ok(channel) => {
                info!(channel_id = %channel.id, caller = %caller, target = %target, "DM channel created");
                Ok(channel)
            }
            Err(StorageError::AlreadyExists(_)) | Err(StorageError::Conflict(_)) => {
                // Someone else created it between our read and write
                debug!(caller = %caller, target = %target, "Lost DM creation race, reading winner");
                self.store.find_dm(caller, target).await?.ok_or_else(|| {
                    RelayError::Conflict("direct message channel was modified concurrently".to_string())
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Create a group channel owned by `owner`.
    ///
    /// The owner is always a member; duplicate ids are collapsed and every
    /// other member must exist.
    pub async fn create_group(
        &self,
        owner: Uuid,
        name: &str,
        member_ids: &[Uuid],
    ) -> Result<GroupChannel> {
        let name = name.trim();
        let len = name.chars().count();
        if !(GROUP_NAME_MIN_LEN..=GROUP_NAME_MAX_LEN).contains(&len) {
            return Err(RelayError::BadRequest(format!(
                "channel name must be between {} and {} characters",
                GROUP_NAME_MIN_LEN, GROUP_NAME_MAX_LEN
            )));
        }

        let mut members = vec![owner];
        for id in member_ids {
            if !members.contains(id) {
                members.push(*id);
            }
        }

        let resolved = try_join_all(
            members[1..]
                .iter()
                .map(|id| self.identities.resolve_by_id(*id)),
        )
        .await?;
        if let Some(missing) = members[1..]
            .iter()
            .zip(&resolved)
            .find_map(|(id, identity)| identity.is_none().then_some(id))
        {
            return Err(RelayError::NotFound(format!("user {} not found", missing)));
        }

        let channel = self.store.create_group(owner, name, &members).await?;
        info!(
            channel_id = %channel.id,
            owner = %owner,
            members = members.len(),
            "Group channel created"
        );

        Ok(GroupChannel {
            channel,
            member_ids: members,
        })
    }

    /// Channels `member` belongs to, oldest first.
    pub async fn list_channels(&self, member: Uuid) -> Result<Vec<Channel>> {
        Ok(self.store.list_channels_for(member).await?)
    }

    /// Memberships of `channel`, in join order.
    pub async fn members(&self, channel: Uuid) -> Result<Vec<ChannelMember>> {
        Ok(self.store.list_members(channel).await?)
    }
}
