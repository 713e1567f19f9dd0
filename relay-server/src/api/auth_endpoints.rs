//! Authentication endpoints for registration, login and the caller's profile

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    api::auth::AuthContext,
    api::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
    error::{ServerError, ServerResult},
    state::AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    summary = "Register a new user account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 403, description = "Signup disabled"),
        (status = 409, description = "Username or email already taken"),
        (status = 422, description = "Invalid username, email or password"),
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<AuthResponse>)> {
    if !state.config.allow_signup {
        return Err(ServerError::Forbidden("User signup is disabled".to_string()));
    }

    let (user, token) = state
        .auth_service
        .register(
            &state.relay,
            &request.username,
            &request.email,
            &request.password,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            access_token: token.access_token,
            expires_at: token.expires_at,
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    summary = "Authenticate and get an access token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ServerResult<Json<AuthResponse>> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ServerError::Auth(
            "Email and password are required".to_string(),
        ));
    }

    let (user, token) = state
        .auth_service
        .authenticate(&state.relay, &request.email, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token: token.access_token,
        expires_at: token.expires_at,
    }))
}

/// The authenticated caller's account
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ServerResult<Json<UserResponse>> {
    let user = state.relay.accounts().get(auth.user_id).await?;
    Ok(Json(UserResponse { user: user.into() }))
}
