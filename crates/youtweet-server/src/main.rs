use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use youtweet_api::auth::{self, AppState, AppStateInner};
use youtweet_api::middleware::require_auth;
use youtweet_api::{comments, dashboard, likes, playlists, subscriptions, tweets, users, videos};
use youtweet_types::api::Envelope;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "youtweet=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("YOUTWEET_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("YOUTWEET_DB_PATH").unwrap_or_else(|_| "youtweet.db".into());
    let host = std::env::var("YOUTWEET_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("YOUTWEET_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = youtweet_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/healthz", get(healthz))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        // videos
        .route(
            "/videos",
            get(videos::list_videos).post(videos::publish_video),
        )
        .route(
            "/videos/{video_id}",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/videos/{video_id}/toggle-publish",
            post(videos::toggle_publish),
        )
        // comments
        .route(
            "/videos/{video_id}/comments",
            get(comments::list_comments).post(comments::add_comment),
        )
        .route(
            "/comments/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // tweets
        .route("/tweets", post(tweets::create_tweet))
        .route(
            "/tweets/{tweet_id}",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        .route("/users/{user_id}/tweets", get(tweets::get_user_tweets))
        // likes
        .route("/videos/{video_id}/like", post(likes::toggle_video_like))
        .route(
            "/comments/{comment_id}/like",
            post(likes::toggle_comment_like),
        )
        .route("/tweets/{tweet_id}/like", post(likes::toggle_tweet_like))
        .route("/likes/videos", get(likes::liked_videos))
        // channels — {channel} is a username for profile/stats and an id
        // for videos/subscribe
        .route(
            "/channels/{channel}/subscribe",
            post(subscriptions::toggle_subscription),
        )
        .route("/channels/{channel}", get(dashboard::channel_profile))
        .route("/channels/{channel}/stats", get(dashboard::channel_stats))
        .route(
            "/channels/{channel}/videos",
            get(dashboard::channel_videos),
        )
        // playlists
        .route("/playlists", post(playlists::create_playlist))
        .route(
            "/playlists/{playlist_id}",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/playlists/{playlist_id}/videos/{video_id}",
            post(playlists::add_video).delete(playlists::remove_video),
        )
        .route(
            "/users/{user_id}/playlists",
            get(playlists::get_user_playlists),
        )
        // users
        .route("/users/me", get(users::current_user))
        .route("/users/history", get(users::watch_history))
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("YouTweet server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(Envelope::ok(serde_json::json!({ "status": "ok" }), "OK"))
}
