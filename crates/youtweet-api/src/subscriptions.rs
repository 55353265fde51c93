use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use youtweet_types::api::{Claims, Envelope};

use crate::auth::AppState;
use crate::error::{ApiResult, parse_uuid, run_blocking};

/// Delete-if-exists-else-insert on the (subscriber, channel) pair.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let channel_id = parse_uuid(&channel_id, "channel")?;

    let subscription_id = Uuid::new_v4();
    let subscribed = run_blocking(move || {
        state
            .db
            .toggle_subscription(subscription_id, claims.sub, channel_id)
    })
    .await?;

    let message = if subscribed { "Subscribed" } else { "Unsubscribed" };
    Ok(Json(Envelope::ok(
        serde_json::json!({ "subscribed": subscribed }),
        message,
    )))
}
