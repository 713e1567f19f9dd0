//! Friend request and friendship endpoints

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::auth::AuthContext,
    api::dto::{
        FriendRequestBody, MessageResponse, RelationshipDto, RelationshipListResponse,
        RelationshipResponse,
    },
    error::{ServerResult, bad_request},
    state::AppState,
};

/// Parse a user id path segment, rejecting malformed ids with 400
pub(crate) fn parse_user_id(raw: &str) -> ServerResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| bad_request("invalid user id"))
}

/// Send a friend request, or accept the pending request in the other direction
#[utoipa::path(
    post,
    path = "/api/v1/relationships/friend-requests",
    tag = "relationships",
    request_body = FriendRequestBody,
    responses(
        (status = 201, description = "Request sent or accepted", body = RelationshipResponse),
        (status = 400, description = "Request to self"),
        (status = 404, description = "No user with that username"),
        (status = 409, description = "Already friends or request already sent"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<FriendRequestBody>,
) -> ServerResult<(StatusCode, Json<RelationshipResponse>)> {
    let row = state
        .relay
        .relationships()
        .initiate(auth.user_id, body.username.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RelationshipResponse {
            relationship: row.into(),
        }),
    ))
}

/// Every relationship the caller holds
#[utoipa::path(
    get,
    path = "/api/v1/relationships",
    tag = "relationships",
    responses(
        (status = 200, description = "Caller's relationships", body = RelationshipListResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_relationships(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ServerResult<Json<RelationshipListResponse>> {
    let rows = state.relay.relationships().list_all(auth.user_id).await?;

    Ok(Json(RelationshipListResponse {
        relationships: rows.into_iter().map(RelationshipDto::from).collect(),
    }))
}

/// Accept an incoming friend request
#[utoipa::path(
    patch,
    path = "/api/v1/relationships/users/{target_user_id}/friend-requests",
    tag = "relationships",
    params(("target_user_id" = String, Path, description = "The requesting user")),
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 400, description = "No incoming request or malformed id"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Already friends"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(target_user_id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let target = parse_user_id(&target_user_id)?;
    let row = state.relay.relationships().accept(auth.user_id, target).await?;

    Ok(Json(MessageResponse {
        message: "Friend request accepted".to_string(),
        relationship: Some(row.into()),
    }))
}

/// Cancel an outgoing request or decline an incoming one
#[utoipa::path(
    delete,
    path = "/api/v1/relationships/users/{target_user_id}/friend-requests",
    tag = "relationships",
    params(("target_user_id" = String, Path, description = "The other user")),
    responses(
        (status = 200, description = "Request cancelled or declined", body = MessageResponse),
        (status = 400, description = "No pending request or malformed id"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Already friends"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_or_decline_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(target_user_id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let target = parse_user_id(&target_user_id)?;
    let outcome = state
        .relay
        .relationships()
        .cancel_or_decline(auth.user_id, target)
        .await?;

    Ok(Json(MessageResponse::new(outcome.message())))
}

/// End a friendship
#[utoipa::path(
    delete,
    path = "/api/v1/relationships/users/{target_user_id}/friends",
    tag = "relationships",
    params(("target_user_id" = String, Path, description = "The friend to remove")),
    responses(
        (status = 200, description = "Friend removed", body = MessageResponse),
        (status = 400, description = "Not friends or malformed id"),
        (status = 404, description = "Unknown user"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(target_user_id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let target = parse_user_id(&target_user_id)?;
    state
        .relay
        .relationships()
        .remove_friend(auth.user_id, target)
        .await?;

    Ok(Json(MessageResponse::new("Friend removed")))
}
