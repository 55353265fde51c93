use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use youtweet_types::api::{Claims, CreatePlaylistRequest, Envelope, UpdatePlaylistRequest};

use crate::PageQuery;
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, parse_uuid, run_blocking};

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePlaylistRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::InvalidArgument("playlist name is required".into()));
    }

    let playlist_id = Uuid::new_v4();
    let playlist = run_blocking(move || {
        state.db.create_playlist(
            playlist_id,
            claims.sub,
            req.name.trim(),
            req.description.trim(),
        )
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(playlist, "Playlist created successfully")),
    ))
}

pub async fn get_user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_uuid(&user_id, "user")?;
    let page = query.to_request();

    let playlists = run_blocking(move || state.db.list_user_playlists(user_id, &page)).await?;

    Ok(Json(Envelope::ok(playlists, "Playlists fetched successfully")))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = parse_uuid(&playlist_id, "playlist")?;

    let playlist = run_blocking(move || state.db.get_playlist(playlist_id))
        .await?
        .ok_or(ApiError::NotFound("playlist"))?;

    Ok(Json(Envelope::ok(playlist, "Playlist found")))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = parse_uuid(&playlist_id, "playlist")?;

    if req.name.is_none() && req.description.is_none() {
        return Err(ApiError::InvalidArgument("nothing to update".into()));
    }
    if matches!(req.name.as_deref(), Some(n) if n.trim().is_empty()) {
        return Err(ApiError::InvalidArgument("playlist name cannot be empty".into()));
    }

    let playlist = run_blocking(move || {
        state.db.update_playlist(
            claims.sub,
            playlist_id,
            req.name.as_deref().map(str::trim),
            req.description.as_deref().map(str::trim),
        )
    })
    .await?;

    Ok(Json(Envelope::ok(playlist, "Playlist updated successfully")))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = parse_uuid(&playlist_id, "playlist")?;

    run_blocking(move || state.db.delete_playlist(claims.sub, playlist_id)).await?;

    Ok(Json(Envelope::ok(
        serde_json::json!({}),
        "Playlist deleted successfully",
    )))
}

pub async fn add_video(
    State(state): State<AppState>,
    Path((playlist_id, video_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = parse_uuid(&playlist_id, "playlist")?;
    let video_id = parse_uuid(&video_id, "video")?;

    let playlist = run_blocking(move || {
        state
            .db
            .add_video_to_playlist(claims.sub, playlist_id, video_id)
    })
    .await?;

    Ok(Json(Envelope::ok(playlist, "Video added to playlist")))
}

pub async fn remove_video(
    State(state): State<AppState>,
    Path((playlist_id, video_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = parse_uuid(&playlist_id, "playlist")?;
    let video_id = parse_uuid(&video_id, "video")?;

    let playlist = run_blocking(move || {
        state
            .db
            .remove_video_from_playlist(claims.sub, playlist_id, video_id)
    })
    .await?;

    Ok(Json(Envelope::ok(playlist, "Video removed from playlist")))
}
