use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};

use youtweet_types::api::{Claims, Envelope, UpdateAvatarRequest, UpdateCoverImageRequest};

use crate::PageQuery;
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, run_blocking};

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user = run_blocking(move || state.db.get_user(claims.sub))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(Envelope::ok(user, "Current user fetched successfully")))
}

pub async fn watch_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.to_request();

    let videos = run_blocking(move || state.db.list_watch_history(claims.sub, &page)).await?;

    Ok(Json(Envelope::ok(videos, "Watch history fetched successfully")))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAvatarRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.avatar_url.trim().is_empty() {
        return Err(ApiError::InvalidArgument("avatar url is required".into()));
    }

    let user =
        run_blocking(move || state.db.update_avatar(claims.sub, req.avatar_url.trim())).await?;

    Ok(Json(Envelope::ok(user, "Avatar updated successfully")))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCoverImageRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.cover_image_url.trim().is_empty() {
        return Err(ApiError::InvalidArgument("cover image url is required".into()));
    }

    let user = run_blocking(move || {
        state
            .db
            .update_cover_image(claims.sub, req.cover_image_url.trim())
    })
    .await?;

    Ok(Json(Envelope::ok(user, "Cover image updated successfully")))
}
