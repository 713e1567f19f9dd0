//! Account registration and lookup

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use super::validation::{validate_email, validate_username};
use crate::models::{NewUser, User};
use crate::relationships::{Identity, IdentityLookup};
use crate::storage::errors::StorageError;
use crate::storage::traits::UserStore;
use crate::{RelayError, Result};

/// Registration input. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

/// Registers accounts and resolves them by id, username or email.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    store: Arc<dyn UserStore>,
}

impl AccountDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create an account after validating its fields.
    ///
    /// Emails are stored lowercased; usernames keep their case.
    pub async fn register(&self, account: NewAccount) -> Result<User> {
        let username = account.username.trim().to_string();
        let email = account.email.trim().to_lowercase();

        validate_username(&username)?;
        validate_email(&email)?;
        if account.password_hash.is_empty() {
            return Err(RelayError::BadRequest("password hash is required".to_string()));
        }

        let created = self
            .store
            .create_user(NewUser {
                username,
                email,
                password_hash: account.password_hash,
            })
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists(field) if field == "email" => {
                    RelayError::Conflict("email already registered".to_string())
                }
                StorageError::AlreadyExists(_) => {
                    RelayError::Conflict("username already taken".to_string())
                }
                other => RelayError::from(other),
            });

        match created {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "Account registered");
                Ok(user)
            }
            Err(e) => {
                debug!(reason = %e, "Registration rejected");
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| RelayError::NotFound("user not found".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.store.find_user_by_username(username).await?)
    }

    /// Case-insensitive email lookup, used for login.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .store
            .find_user_by_email(&email.trim().to_lowercase())
            .await?)
    }
}

fn identity_of(user: User) -> Identity {
    Identity {
        id: user.id,
        handle: user.username,
    }
}

#[async_trait]
impl IdentityLookup for AccountDirectory {
    async fn resolve_by_handle(&self, handle: &str) -> Result<Option<Identity>> {
        Ok(self.find_by_username(handle).await?.map(identity_of))
    }

    async fn resolve_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.store.get_user(id).await?.map(identity_of))
    }
}
