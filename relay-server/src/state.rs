//! Application state management

use relay::core::RelayManager;

use crate::api::auth_service::AuthService;
use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Debug)]
pub struct AppState {
    pub relay: RelayManager,
    pub config: ServerConfig,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(relay: RelayManager, config: ServerConfig) -> Self {
        let auth_service = AuthService::new(&config);
        Self {
            relay,
            config,
            auth_service,
        }
    }
}
