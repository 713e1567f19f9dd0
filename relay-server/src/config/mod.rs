//! Server configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_request_size: usize,

    /// Secret key for signing access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_expiration_secs: u64,

    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,

    /// Allow user registration
    pub allow_signup: bool,

    /// Relay configuration file for storage and logging
    pub config_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_request_size: 1024 * 1024,
            jwt_secret: String::new(),
            jwt_expiration_secs: 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            allow_signup: true,
            config_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from CLI arguments and environment variables.
    /// CLI arguments take precedence over environment variables.
    pub fn from_cli_and_env(cli_args: crate::cli::CliArgs) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = cli_args.port {
            config.port = port;
        } else if let Ok(port) = env::var("RELAY_PORT") {
            config.port = port.parse()?;
        }

        if let Some(max_size) = cli_args.max_request_size {
            config.max_request_size = max_size;
        } else if let Ok(max_size) = env::var("RELAY_MAX_REQUEST_SIZE") {
            config.max_request_size = max_size.parse()?;
        }

        if let Some(jwt_secret) = cli_args.jwt_secret {
            config.jwt_secret = jwt_secret;
        } else if let Ok(jwt_secret) = env::var("RELAY_JWT_SECRET") {
            config.jwt_secret = jwt_secret;
        }
        if config.jwt_secret.is_empty() {
            config.jwt_secret = Self::generate_jwt_secret();
        }

        if let Some(exp_secs) = cli_args.jwt_expiration_secs {
            config.jwt_expiration_secs = exp_secs;
        } else if let Ok(exp_secs) = env::var("RELAY_JWT_EXPIRATION_SECS") {
            config.jwt_expiration_secs = exp_secs.parse()?;
        }

        if let Some(cost) = cli_args.bcrypt_cost {
            config.bcrypt_cost = cost;
        } else if let Ok(cost) = env::var("RELAY_BCRYPT_COST") {
            config.bcrypt_cost = cost.parse()?;
        }
        if !(4..=31).contains(&config.bcrypt_cost) {
            anyhow::bail!("bcrypt cost must be between 4 and 31, got {}", config.bcrypt_cost);
        }

        if let Some(allow_signup) = cli_args.allow_signup {
            config.allow_signup = allow_signup;
        } else if let Ok(allow_signup) = env::var("RELAY_ALLOW_SIGNUP") {
            config.allow_signup = allow_signup.parse().unwrap_or(true);
        }

        if let Some(config_path) = cli_args.config_file {
            config.config_file = Some(config_path);
        } else if let Ok(config_path) = env::var("RELAY_CONFIG_FILE") {
            config.config_file = Some(PathBuf::from(config_path));
        }

        Ok(config)
    }

    /// Generate a random 64 character signing secret
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;
        use rand::distr::Alphanumeric;
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;

    #[test]
    fn test_cli_values_win_and_secret_is_generated() {
        let args = CliArgs {
            port: Some(9090),
            jwt_expiration_secs: Some(60),
            bcrypt_cost: Some(4),
            allow_signup: Some(false),
            ..Default::default()
        };

        let config = ServerConfig::from_cli_and_env(args).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.jwt_expiration_secs, 60);
        assert_eq!(config.bcrypt_cost, 4);
        assert!(!config.allow_signup);
        assert_eq!(config.jwt_secret.len(), 64);
    }

    #[test]
    fn test_out_of_range_bcrypt_cost_is_rejected() {
        let args = CliArgs {
            bcrypt_cost: Some(2),
            ..Default::default()
        };
        assert!(ServerConfig::from_cli_and_env(args).is_err());
    }
}
