use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use youtweet_db::queries::videos::{NewVideo, VideoChanges};
use youtweet_db::query::{SortSpec, VideoFilter, VideoSortField};
use youtweet_types::api::{Claims, Envelope, PublishVideoRequest, UpdateVideoRequest};
use youtweet_types::pagination::{DEFAULT_PAGE_SIZE, PageRequest, SortDirection};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, parse_uuid, run_blocking};

/// Feed query parameters, forwarded verbatim from the client:
/// `?page=1&limit=10&query=cat&sortBy=createdAt&sortType=-1&userId=...`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<i8>,
    pub user_id: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

pub async fn list_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<VideoListQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner_id = query
        .user_id
        .as_deref()
        .map(|raw| parse_uuid(raw, "user"))
        .transpose()?;

    let field = query
        .sort_by
        .as_deref()
        .map(VideoSortField::parse)
        .transpose()?
        .unwrap_or_default();
    let direction = match query.sort_type {
        None => SortDirection::default(),
        Some(n) => SortDirection::from_numeric(n).ok_or_else(|| {
            ApiError::InvalidArgument(format!("sortType must be 1 or -1, got {n}"))
        })?,
    };

    // owners see their own drafts when listing their own uploads
    let published_only = owner_id != Some(claims.sub);

    let filter = VideoFilter {
        text_query: query.query,
        owner_id,
        published_only,
    };
    let sort = SortSpec { field, direction };
    let page = PageRequest::new(query.page, query.limit);

    let videos = run_blocking(move || state.db.list_videos(&filter, &sort, &page)).await?;

    Ok(Json(Envelope::ok(videos, "Videos fetched successfully")))
}

pub async fn publish_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PublishVideoRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "title and description are required".into(),
        ));
    }
    if req.video_file.trim().is_empty() || req.thumbnail.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "video file and thumbnail are required".into(),
        ));
    }
    if !req.duration.is_finite() || req.duration < 0.0 {
        return Err(ApiError::InvalidArgument(
            "duration must be a non-negative number".into(),
        ));
    }

    let video_id = Uuid::new_v4();
    let video = run_blocking(move || {
        state.db.publish_video(
            video_id,
            claims.sub,
            &NewVideo {
                title: req.title.trim(),
                description: req.description.trim(),
                video_file: &req.video_file,
                thumbnail: &req.thumbnail,
                duration: req.duration,
            },
        )
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(video, "Video uploaded successfully")),
    ))
}

/// Fetching a video counts as watching it: the view counter moves and
/// the viewer's history is refreshed.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;

    let video = run_blocking(move || state.db.watch_video(claims.sub, video_id)).await?;

    Ok(Json(Envelope::ok(video, "Video found")))
}

pub async fn update_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateVideoRequest>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;

    if req.title.is_none() && req.description.is_none() && req.thumbnail.is_none() {
        return Err(ApiError::InvalidArgument("nothing to update".into()));
    }
    for (field, value) in [
        ("title", &req.title),
        ("description", &req.description),
        ("thumbnail", &req.thumbnail),
    ] {
        if matches!(value.as_deref(), Some(v) if v.trim().is_empty()) {
            return Err(ApiError::InvalidArgument(format!("{field} cannot be empty")));
        }
    }

    let video = run_blocking(move || {
        state.db.update_video(
            claims.sub,
            video_id,
            &VideoChanges {
                title: req.title.as_deref(),
                description: req.description.as_deref(),
                thumbnail: req.thumbnail.as_deref(),
            },
        )
    })
    .await?;

    Ok(Json(Envelope::ok(video, "Video details updated successfully")))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;

    run_blocking(move || state.db.delete_video(claims.sub, video_id)).await?;

    Ok(Json(Envelope::ok(
        serde_json::json!({}),
        "Video deleted successfully",
    )))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_uuid(&video_id, "video")?;

    let published = run_blocking(move || state.db.toggle_publish(claims.sub, video_id)).await?;

    Ok(Json(Envelope::ok(
        serde_json::json!({ "published": published }),
        "Publish status toggled successfully",
    )))
}
