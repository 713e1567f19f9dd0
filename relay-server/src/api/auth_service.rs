//! Authentication service over the account directory

use relay::{
    RelayError,
    accounts::{NewAccount, validate_email, validate_password, validate_username},
    core::RelayManager,
    models::User,
};

use crate::{
    api::auth::{generate_jwt_token, hash_password, verify_password},
    config::ServerConfig,
    error::{ServerError, ServerResult},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Issued access token with its expiry timestamp
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: i64,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_secret: String,
    jwt_expiration_secs: u64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiration_secs: config.jwt_expiration_secs,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Validate, hash and store a new account, then issue its first token
    pub async fn register(
        &self,
        relay: &RelayManager,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServerResult<(User, IssuedToken)> {
        validate_username(username.trim()).map_err(field_error)?;
        validate_email(email.trim()).map_err(field_error)?;
        validate_password(password).map_err(field_error)?;

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| ServerError::Internal(format!("Password hashing task failed: {}", e)))??;

        let user = relay
            .accounts()
            .register(NewAccount::new(username, email, password_hash))
            .await?;
        let token = self.issue_token(&user)?;

        Ok((user, token))
    }

    /// Check credentials and issue a token
    pub async fn authenticate(
        &self,
        relay: &RelayManager,
        email: &str,
        password: &str,
    ) -> ServerResult<(User, IssuedToken)> {
        let user = relay
            .accounts()
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| ServerError::Auth(INVALID_CREDENTIALS.to_string()))?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServerError::Internal(format!("Password check task failed: {}", e)))??;
        if !valid {
            tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
            return Err(ServerError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub fn issue_token(&self, user: &User) -> ServerResult<IssuedToken> {
        let (access_token, expires_at) = generate_jwt_token(
            &user.id,
            &user.username,
            &self.jwt_secret,
            self.jwt_expiration_secs,
        )?;
        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }
}

fn field_error(err: RelayError) -> ServerError {
    match err {
        RelayError::BadRequest(msg) => ServerError::Validation(msg),
        other => other.into(),
    }
}
