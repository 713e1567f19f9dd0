//! API implementation for the Relay HTTP server

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, patch, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod auth;
pub mod auth_endpoints;
pub mod auth_service;
pub mod channels;
pub mod dto;
pub mod relationships;

use auth::auth_middleware;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        auth_endpoints::register,
        auth_endpoints::login,
        auth_endpoints::me,
        relationships::send_friend_request,
        relationships::list_relationships,
        relationships::accept_friend_request,
        relationships::cancel_or_decline_friend_request,
        relationships::remove_friend,
        channels::get_or_create_dm,
        channels::create_group,
        channels::list_channels,
    ),
    components(
        schemas(
            dto::UserDto,
            dto::RegisterRequest,
            dto::LoginRequest,
            dto::AuthResponse,
            dto::UserResponse,
            dto::RelationshipDto,
            dto::FriendRequestBody,
            dto::RelationshipResponse,
            dto::RelationshipListResponse,
            dto::MessageResponse,
            dto::ChannelDto,
            dto::ChannelResponse,
            dto::ChannelListResponse,
            dto::CreateGroupRequest,
            dto::GroupChannelResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, login and the current user"),
        (name = "relationships", description = "Friend requests and friendships"),
        (name = "channels", description = "Direct message and group channels"),
    ),
    info(
        title = "Relay API",
        version = "1.0.0",
        description = "Accounts, friend-request negotiation and channels for the Relay social graph.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the main router with all API endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth_endpoints::register))
        .route("/auth/login", post(auth_endpoints::login));

    let protected = Router::new()
        .route("/users/me", get(auth_endpoints::me))
        .route("/users/{target_user_id}/dm", get(channels::get_or_create_dm))
        .route("/relationships", get(relationships::list_relationships))
        .route(
            "/relationships/friend-requests",
            post(relationships::send_friend_request),
        )
        .route(
            "/relationships/users/{target_user_id}/friend-requests",
            patch(relationships::accept_friend_request)
                .delete(relationships::cancel_or_decline_friend_request),
        )
        .route(
            "/relationships/users/{target_user_id}/friends",
            delete(relationships::remove_friend),
        )
        .route("/channels", get(channels::list_channels))
        .route("/channels/groups", post(channels::create_group))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_router = public.merge(protected).with_state(state.clone());

    let swagger_router =
        SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone())
        .nest("/api/v1", api_router)
        .merge(swagger_router)
        .layer(RequestBodyLimitLayer::new(state.config.max_request_size))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and storage are up", body = serde_json::Value),
        (status = 503, description = "Storage is not answering", body = serde_json::Value),
    )
)]
async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.relay.health_check().await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "OK",
                "version": relay::VERSION,
            })),
        ),
        outcome => {
            tracing::warn!(?outcome, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "UNAVAILABLE",
                    "version": relay::VERSION,
                })),
            )
        }
    }
}
