use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use youtweet_types::api::{Claims, Envelope};
use youtweet_types::models::LikeTarget;

use crate::PageQuery;
use crate::auth::AppState;
use crate::error::{ApiResult, parse_uuid, run_blocking};

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;
    toggle(state, claims, LikeTarget::Video(video_id)).await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = parse_uuid(&comment_id, "comment")?;
    toggle(state, claims, LikeTarget::Comment(comment_id)).await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let tweet_id = parse_uuid(&tweet_id, "tweet")?;
    toggle(state, claims, LikeTarget::Tweet(tweet_id)).await
}

/// Delete-if-exists-else-insert; the response reports which state the
/// toggle landed in.
async fn toggle(
    state: AppState,
    claims: Claims,
    target: LikeTarget,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let like_id = Uuid::new_v4();

    let liked = run_blocking(move || state.db.toggle_like(like_id, claims.sub, &target)).await?;

    let message = if liked { "Like added" } else { "Like removed" };
    Ok(Json(Envelope::ok(
        serde_json::json!({ "liked": liked }),
        message,
    )))
}

pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.to_request();

    let videos = run_blocking(move || state.db.list_liked_videos(claims.sub, &page)).await?;

    Ok(Json(Envelope::ok(videos, "Liked videos fetched successfully")))
}
