//! Account storage implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use surrealdb::Connection;
use uuid::Uuid;

use super::base::{SharedStorage, check_statements, client_error};
use super::relationship::parse_uuid;
use crate::models::{NewUser, User};
use crate::storage::errors::StorageError;
use crate::storage::traits::UserStore;

const USER_FIELDS: &str =
    "record::id(id) AS id, username, email, password_hash, created_at, updated_at";

/// Internal representation of a user record for SurrealDB
#[derive(Debug, Clone, serde::Deserialize)]
struct SurrealUser {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SurrealUser> for User {
    type Error = StorageError;

    fn try_from(record: SurrealUser) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid("user id", &record.id)?,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl<C> SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn select_single_user(
        &self,
        operation: &str,
        source: &str,
        key: &'static str,
        value: String,
    ) -> Result<Option<User>, StorageError> {
        self.bounded(operation, async {
            let query = format!("SELECT {} FROM {} LIMIT 1", USER_FIELDS, source);

            let mut result = self
                .client
                .query(query)
                .bind((key, value))
                .await
                .map_err(|e| client_error(operation, e))?;

            let records: Vec<SurrealUser> = result
                .take(0)
                .map_err(|e| StorageError::Query(format!("Failed to parse user: {}", e)))?;

            records.into_iter().next().map(User::try_from).transpose()
        })
        .await
    }
}

#[async_trait]
impl<C> UserStore for SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        self.bounded("create_user", async {
            let query = format!(
                r#"
                CREATE type::thing('user', $id) CONTENT {{
                    username: $username,
                    email: $email,
                    password_hash: $password_hash
                }};
                SELECT {} FROM type::thing('user', $id);
                "#,
                USER_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("id", Uuid::new_v4().to_string()))
                .bind(("username", user.username))
                .bind(("email", user.email))
                .bind(("password_hash", user.password_hash))
                .await
                .map_err(|e| client_error("create_user", e))?;

            // Name the offending field so callers can report it
            check_statements("create_user", &mut result).map_err(|e| match e {
                StorageError::AlreadyExists(msg) if msg.contains("user_email_idx") => {
                    StorageError::AlreadyExists("email".to_string())
                }
                StorageError::AlreadyExists(msg) if msg.contains("user_username_idx") => {
                    StorageError::AlreadyExists("username".to_string())
                }
                other => other,
            })?;

            let records: Vec<SurrealUser> = result
                .take(1)
                .map_err(|e| StorageError::Query(format!("Failed to parse created user: {}", e)))?;

            records
                .into_iter()
                .next()
                .map(User::try_from)
                .transpose()?
                .ok_or_else(|| StorageError::Internal("No user created".to_string()))
        })
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        self.select_single_user(
            "get_user",
            "type::thing('user', $id)",
            "id",
            id.to_string(),
        )
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.select_single_user(
            "find_user_by_username",
            "user WHERE username = $username",
            "username",
            username.to_string(),
        )
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.select_single_user(
            "find_user_by_email",
            "user WHERE email = $email",
            "email",
            email.to_string(),
        )
        .await
    }
}
