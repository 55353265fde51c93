use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use uuid::Uuid;

use youtweet_db::error::StoreError;
use youtweet_types::api::ErrorBody;

/// Boundary failure taxonomy, rendered as the `{statusCode, message,
/// errors}` envelope. Store errors map across one to one; `Unauthorized`
/// exists only for credential checks at login.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidArgument(m) => ApiError::InvalidArgument(m),
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Forbidden(m) => ApiError::Forbidden(m.to_string()),
            StoreError::Conflict(m) => ApiError::Conflict(m),
            StoreError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // storage details go to the log, never the envelope
        if let ApiError::Internal(err) = &self {
            error!("internal error: {:#}", err);
        }

        let status = self.status();
        let message = self.to_string();
        let body = ErrorBody {
            status_code: status.as_u16(),
            message: message.clone(),
            errors: vec![message],
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Path and query ids arrive as strings so a malformed id is an
/// `InvalidArgument`, not a routing 404.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| ApiError::InvalidArgument(format!("invalid {what} id: {raw}")))
}

/// Run a store call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!(e))
        })?
        .map_err(ApiError::from)
}
