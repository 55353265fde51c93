use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use youtweet_types::api::{Claims, CreateCommentRequest, Envelope, UpdateCommentRequest};

use crate::PageQuery;
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, parse_uuid, run_blocking};

/// Zero comments is a valid page; whether the video exists is checked on
/// write, not on read.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;
    let page = query.to_request();

    let comments = run_blocking(move || state.db.list_comments(video_id, &page)).await?;

    Ok(Json(Envelope::ok(comments, "Comments fetched successfully")))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;
    if req.content.trim().is_empty() {
        return Err(ApiError::InvalidArgument("comment cannot be empty".into()));
    }

    let comment_id = Uuid::new_v4();
    let comment = run_blocking(move || {
        state
            .db
            .add_comment(comment_id, video_id, claims.sub, req.content.trim())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(comment, "Comment added successfully")),
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = parse_uuid(&comment_id, "comment")?;
    if req.content.trim().is_empty() {
        return Err(ApiError::InvalidArgument("comment cannot be empty".into()));
    }

    let comment = run_blocking(move || {
        state
            .db
            .update_comment(claims.sub, comment_id, req.content.trim())
    })
    .await?;

    Ok(Json(Envelope::ok(comment, "Comment updated successfully")))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = parse_uuid(&comment_id, "comment")?;

    run_blocking(move || state.db.delete_comment(claims.sub, comment_id)).await?;

    Ok(Json(Envelope::ok(
        serde_json::json!({}),
        "Comment deleted successfully",
    )))
}
