//! Data Transfer Objects for the API

use chrono::{DateTime, Utc};
use relay::models::{Channel, Relationship, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Account registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// 3 to 64 characters: letters, digits, `_`, `.` or `-`
    pub username: String,
    pub email: String,
    /// 8 to 64 characters
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register and login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserDto,
    /// HS256 bearer token
    pub access_token: String,
    /// Token expiry as a unix timestamp
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: UserDto,
}

/// Relationship row from the caller's perspective
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RelationshipDto {
    pub id: Uuid,
    /// The caller
    pub user_id: Uuid,
    pub other_user_id: Uuid,
    /// One of `outgoing`, `incoming`, `friend`
    pub relationship_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Relationship> for RelationshipDto {
    fn from(row: Relationship) -> Self {
        Self {
            id: row.id,
            user_id: row.owner,
            other_user_id: row.counterparty,
            relationship_status: row.status.as_str().to_string(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Friend request by handle
#[derive(Debug, Deserialize, ToSchema)]
pub struct FriendRequestBody {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelationshipResponse {
    pub relationship: RelationshipDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelationshipListResponse {
    pub relationships: Vec<RelationshipDto>,
}

/// Confirmation for accept, cancel, decline and remove
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipDto>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            relationship: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChannelDto {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    /// `dm` or `group`
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Channel> for ChannelDto {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name,
            owner_id: channel.owner,
            kind: channel.kind.as_str().to_string(),
            created_at: channel.created_at,
            updated_at: channel.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelResponse {
    pub channel: ChannelDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelListResponse {
    pub channels: Vec<ChannelDto>,
}

/// Group creation request; the caller becomes owner and member
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupChannelResponse {
    pub channel: ChannelDto,
    pub member_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay::models::RelationshipStatus;

    #[test]
    fn test_relationship_dto_uses_caller_perspective() {
        let now = Utc::now();
        let row = Relationship {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            counterparty: Uuid::new_v4(),
            status: RelationshipStatus::Incoming,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(RelationshipDto::from(row.clone())).unwrap();
        assert_eq!(json["user_id"], row.owner.to_string());
        assert_eq!(json["other_user_id"], row.counterparty.to_string());
        assert_eq!(json["relationship_status"], "incoming");
    }

    #[test]
    fn test_message_response_omits_missing_relationship() {
        let json = serde_json::to_value(MessageResponse::new("Friend removed")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Friend removed" }));
    }
}
