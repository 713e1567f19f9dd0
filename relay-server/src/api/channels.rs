//! DM and group channel endpoints

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::auth::AuthContext,
    api::dto::{
        ChannelDto, ChannelListResponse, ChannelResponse, CreateGroupRequest,
        GroupChannelResponse,
    },
    api::relationships::parse_user_id,
    error::ServerResult,
    state::AppState,
};

/// Get or create the DM channel between the caller and another user
#[utoipa::path(
    get,
    path = "/api/v1/users/{target_user_id}/dm",
    tag = "channels",
    params(("target_user_id" = String, Path, description = "The other participant")),
    responses(
        (status = 200, description = "The DM channel", body = ChannelResponse),
        (status = 400, description = "DM with self or malformed id"),
        (status = 404, description = "Unknown user"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_or_create_dm(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(target_user_id): Path<String>,
) -> ServerResult<Json<ChannelResponse>> {
    let target = parse_user_id(&target_user_id)?;
    let channel = state
        .relay
        .channels()
        .get_or_create_dm(auth.user_id, target)
        .await?;

    Ok(Json(ChannelResponse {
        channel: channel.into(),
    }))
}

/// Create a group channel owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/channels/groups",
    tag = "channels",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupChannelResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "Unknown member"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateGroupRequest>,
) -> ServerResult<(StatusCode, Json<GroupChannelResponse>)> {
    let group = state
        .relay
        .channels()
        .create_group(auth.user_id, &request.name, &request.member_ids)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupChannelResponse {
            channel: group.channel.into(),
            member_ids: group.member_ids,
        }),
    ))
}

/// Channels the caller belongs to
#[utoipa::path(
    get,
    path = "/api/v1/channels",
    tag = "channels",
    responses(
        (status = 200, description = "Caller's channels", body = ChannelListResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ServerResult<Json<ChannelListResponse>> {
    let channels = state.relay.channels().list_channels(auth.user_id).await?;

    Ok(Json(ChannelListResponse {
        channels: channels.into_iter().map(ChannelDto::from).collect(),
    }))
}
