use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use youtweet_types::api::{Claims, Envelope};

use crate::PageQuery;
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, parse_uuid, run_blocking};

/// Channel dashboard: resolve the username, then aggregate. A channel
/// with no content reports explicit zeros, never a missing field.
pub async fn channel_stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let channel_id = resolve_channel(&state, username).await?;

    let stats = run_blocking(move || state.db.channel_stats(channel_id)).await?;

    Ok(Json(Envelope::ok(stats, "Stats of the channel")))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let channel_id = parse_uuid(&channel_id, "channel")?;
    let page = query.to_request();

    let videos = run_blocking(move || state.db.channel_videos(channel_id, &page)).await?;

    Ok(Json(Envelope::ok(videos, "Channel videos fetched successfully")))
}

pub async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let profile = run_blocking(move || state.db.channel_profile(&username, claims.sub))
        .await?
        .ok_or(ApiError::NotFound("channel"))?;

    Ok(Json(Envelope::ok(profile, "Channel profile fetched successfully")))
}

async fn resolve_channel(state: &AppState, username: String) -> ApiResult<Uuid> {
    let state = state.clone();
    let user = run_blocking(move || state.db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::NotFound("channel"))?;

    user.id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id: {e}")))
}
