//! Channel storage implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use surrealdb::Connection;
use uuid::Uuid;

use super::base::{SharedStorage, check_statements, client_error};
use super::relationship::parse_uuid;
use crate::models::{Channel, ChannelKind, ChannelMember, dm_key};
use crate::storage::errors::StorageError;
use crate::storage::traits::ChannelStore;

const CHANNEL_FIELDS: &str = "record::id(id) AS id, name, owner, kind, created_at, updated_at";

/// Internal representation of a channel record for SurrealDB
#[derive(Debug, Clone, serde::Deserialize)]
struct SurrealChannel {
    id: String,
    name: String,
    owner: String,
    kind: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SurrealChannel> for Channel {
    type Error = StorageError;

    fn try_from(record: SurrealChannel) -> Result<Self, Self::Error> {
        let kind = match record.kind.as_str() {
            "dm" => ChannelKind::Dm,
            "group" => ChannelKind::Group,
            other => {
                return Err(StorageError::Serialization(format!(
                    "Invalid channel kind: {}",
                    other
                )));
            }
        };

        Ok(Self {
            id: parse_uuid("channel id", &record.id)?,
            name: record.name,
            owner: parse_uuid("channel owner", &record.owner)?,
            kind,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Internal representation of a membership record for SurrealDB
#[derive(Debug, Clone, serde::Deserialize)]
struct SurrealChannelMember {
    channel: String,
    member: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<SurrealChannelMember> for ChannelMember {
    type Error = StorageError;

    fn try_from(record: SurrealChannelMember) -> Result<Self, Self::Error> {
        Ok(Self {
            channel: parse_uuid("membership channel", &record.channel)?,
            member: parse_uuid("membership member", &record.member)?,
            joined_at: record.joined_at,
        })
    }
}

impl<C> SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Insert a channel and its memberships in one transaction
    async fn insert_channel(
        &self,
        operation: &str,
        owner: Uuid,
        name: String,
        kind: ChannelKind,
        lookup_key: Option<String>,
        members: Vec<String>,
    ) -> Result<Channel, StorageError> {
        let id = Uuid::new_v4().to_string();
        let lookup_key = lookup_key.unwrap_or_else(|| format!("{}:{}", kind, id));

        let query = format!(
            r#"
            BEGIN TRANSACTION;
            CREATE type::thing('channel', $id) CONTENT {{
                name: $name,
                owner: $owner,
                kind: $kind,
                lookup_key: $lookup_key
            }};
            FOR $member IN $members {{
                CREATE channel_member CONTENT {{ channel: $id, member: $member }};
            }};
            COMMIT TRANSACTION;
            SELECT {} FROM type::thing('channel', $id);
            "#,
            CHANNEL_FIELDS
        );

        let mut result = self
            .client
            .query(query)
            .bind(("id", id))
            .bind(("name", name))
            .bind(("owner", owner.to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .bind(("lookup_key", lookup_key))
            .bind(("members", members))
            .await
            .map_err(|e| client_error(operation, e))?;

        let last = result.num_statements().saturating_sub(1);
        check_statements(operation, &mut result)?;

        let records: Vec<SurrealChannel> = result
            .take(last)
            .map_err(|e| StorageError::Query(format!("Failed to parse created channel: {}", e)))?;

        records
            .into_iter()
            .next()
            .map(Channel::try_from)
            .transpose()?
            .ok_or_else(|| StorageError::Internal("Channel committed but not readable".to_string()))
    }
}

#[async_trait]
impl<C> ChannelStore for SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn find_dm(&self, a: Uuid, b: Uuid) -> Result<Option<Channel>, StorageError> {
        self.bounded("find_dm", async {
            let query = format!(
                "SELECT {} FROM channel WHERE lookup_key = $lookup_key LIMIT 1",
                CHANNEL_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("lookup_key", dm_key(a, b)))
                .await
                .map_err(|e| client_error("find_dm", e))?;

            let records: Vec<SurrealChannel> = result
                .take(0)
                .map_err(|e| StorageError::Query(format!("Failed to parse channel: {}", e)))?;

            records.into_iter().next().map(Channel::try_from).transpose()
        })
        .await
    }

    async fn create_dm(&self, a: Uuid, b: Uuid) -> Result<Channel, StorageError> {
        if a == b {
            return Err(StorageError::Validation(
                "A DM channel needs two distinct members".to_string(),
            ));
        }

        let key = dm_key(a, b);
        let name = format!("dm_{}", key.replace(':', "_"));

        self.bounded(
            "create_dm",
            self.insert_channel(
                "create_dm",
                a,
                name,
                ChannelKind::Dm,
                Some(key),
                vec![a.to_string(), b.to_string()],
            ),
        )
        .await
    }

    async fn create_group(
        &self,
        owner: Uuid,
        name: &str,
        members: &[Uuid],
    ) -> Result<Channel, StorageError> {
        let members = members.iter().map(Uuid::to_string).collect();

        self.bounded(
            "create_group",
            self.insert_channel(
                "create_group",
                owner,
                name.to_string(),
                ChannelKind::Group,
                None,
                members,
            ),
        )
        .await
    }

    async fn list_channels_for(&self, member: Uuid) -> Result<Vec<Channel>, StorageError> {
        self.bounded("list_channels_for", async {
            let query = format!(
                "SELECT {} FROM channel \
                 WHERE record::id(id) IN (SELECT VALUE channel FROM channel_member WHERE member = $member) \
                 ORDER BY created_at ASC",
                CHANNEL_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("member", member.to_string()))
                .await
                .map_err(|e| client_error("list_channels_for", e))?;

            let records: Vec<SurrealChannel> = result
                .take(0)
                .map_err(|e| StorageError::Query(format!("Failed to parse channels: {}", e)))?;

            records.into_iter().map(Channel::try_from).collect()
        })
        .await
    }

    async fn list_members(&self, channel: Uuid) -> Result<Vec<ChannelMember>, StorageError> {
        self.bounded("list_members", async {
            let mut result = self
                .client
                .query(
                    "SELECT channel, member, joined_at FROM channel_member \
                     WHERE channel = $channel ORDER BY joined_at ASC",
                )
                .bind(("channel", channel.to_string()))
                .await
                .map_err(|e| client_error("list_members", e))?;

            let records: Vec<SurrealChannelMember> = result
                .take(0)
                .map_err(|e| StorageError::Query(format!("Failed to parse members: {}", e)))?;

            records.into_iter().map(ChannelMember::try_from).collect()
        })
        .await
    }
}
