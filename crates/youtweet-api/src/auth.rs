use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use youtweet_db::Database;
use youtweet_db::queries::users::NewUser;
use youtweet_types::api::{
    Claims, Envelope, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

use crate::error::{ApiError, ApiResult, run_blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::InvalidArgument(
            "username must be 3-32 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::InvalidArgument("email is not valid".into()));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::InvalidArgument("full name is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::InvalidArgument(
            "password must be at least 8 characters".into(),
        ));
    }

    let username = req.username.to_lowercase();
    let email = req.email.to_lowercase();

    // Check if username or email is taken
    {
        let state = state.clone();
        let (username, email) = (username.clone(), email.clone());
        if run_blocking(move || state.db.username_or_email_taken(&username, &email)).await? {
            return Err(ApiError::Conflict(
                "user with username or email already exists".into(),
            ));
        }
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();

    let user = {
        let state = state.clone();
        run_blocking(move || {
            state.db.create_user(
                user_id,
                &NewUser {
                    username: &username,
                    email: &email,
                    full_name: req.full_name.trim(),
                    password_hash: &password_hash,
                    avatar_url: req.avatar_url.as_deref(),
                    cover_image_url: req.cover_image_url.as_deref(),
                },
            )
        })
        .await?
    };

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(
            RegisterResponse { user_id, token },
            "User registered successfully",
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.username.is_none() && req.email.is_none() {
        return Err(ApiError::InvalidArgument(
            "email or username is required".into(),
        ));
    }

    let username = req.username.map(|u| u.to_lowercase());
    let email = req.email.map(|e| e.to_lowercase());

    let user = {
        let state = state.clone();
        run_blocking(move || state.db.find_user_for_login(username.as_deref(), email.as_deref()))
            .await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("invalid password".into()))?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id: {e}")))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(Envelope::ok(
        LoginResponse {
            user_id,
            username: user.username,
            token,
        },
        "User logged in successfully",
    )))
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> ApiResult<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
}
