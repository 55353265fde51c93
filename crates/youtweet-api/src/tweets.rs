use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use youtweet_types::api::{Claims, CreateTweetRequest, Envelope, UpdateTweetRequest};

use crate::PageQuery;
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, parse_uuid, run_blocking};

const MAX_TWEET_CHARS: usize = 280;

fn validate_content(content: &str) -> ApiResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::InvalidArgument("tweet cannot be empty".into()));
    }
    if content.chars().count() > MAX_TWEET_CHARS {
        return Err(ApiError::InvalidArgument(format!(
            "tweet must be at most {MAX_TWEET_CHARS} characters"
        )));
    }
    Ok(content)
}

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTweetRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_content(&req.content)?;

    let tweet_id = Uuid::new_v4();
    let tweet = run_blocking(move || {
        state
            .db
            .create_tweet(tweet_id, claims.sub, req.content.trim())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(tweet, "Tweet posted successfully")),
    ))
}

pub async fn get_user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_uuid(&user_id, "user")?;
    let page = query.to_request();

    let tweets = run_blocking(move || state.db.list_user_tweets(user_id, &page)).await?;

    Ok(Json(Envelope::ok(tweets, "Tweets fetched successfully")))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateTweetRequest>,
) -> ApiResult<impl IntoResponse> {
    let tweet_id = parse_uuid(&tweet_id, "tweet")?;
    validate_content(&req.content)?;

    let tweet = run_blocking(move || {
        state
            .db
            .update_tweet(claims.sub, tweet_id, req.content.trim())
    })
    .await?;

    Ok(Json(Envelope::ok(tweet, "Tweet updated successfully")))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let tweet_id = parse_uuid(&tweet_id, "tweet")?;

    run_blocking(move || state.db.delete_tweet(claims.sub, tweet_id)).await?;

    Ok(Json(Envelope::ok(
        serde_json::json!({}),
        "Tweet deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::validate_content;

    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(validate_content("  hello  ").unwrap(), "hello");
        assert!(validate_content("   ").is_err());
        assert!(validate_content(&"x".repeat(280)).is_ok());
        assert!(validate_content(&"x".repeat(281)).is_err());
    }
}
