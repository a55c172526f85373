//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use recipe_book_core::ports::PortError;
use recipe_book_core::validation::required;
use recipe_book_core::NewPerson;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorResponse};
use crate::web::middleware::bearer_token;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub login: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Send back as `Authorization: Bearer <token>`.
    pub token: String,
    pub person_id: i32,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Stored password hash is unreadable".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/register - Create a new account
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Person registered", body = RegisterResponse),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 409, description = "Login already taken", body = ErrorResponse)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required("name", req.name)?;
    let surname = required("surname", req.surname)?;
    let login = required("login", req.login)?;
    let password = required("password", req.password)?;

    let person = state
        .db
        .create_person(&NewPerson {
            name,
            surname,
            login,
            hashed_password: hash_password(&password)?,
        })
        .await?;
    info!("Registered person {}", person.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: person.id,
            login: person.login,
        }),
    ))
}

fn session_expiry(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, ApiError> {
    Duration::try_days(days)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            ApiError::Internal(format!("session lifetime of {days} days is out of range"))
        })
}

/// POST /api/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Unknown login and wrong password look the same to the client.
    let creds = match state.db.get_person_credentials(req.login.trim()).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized.into()),
        Err(e) => return Err(e.into()),
    };
    if !verify_password(&req.password, &creds.hashed_password)? {
        return Err(PortError::Unauthorized.into());
    }

    let token = Uuid::new_v4().to_string();
    let expires_at = session_expiry(Utc::now(), state.config.auth_session_days)?;
    state
        .db
        .create_auth_session(&token, creds.id, expires_at)
        .await?;

    Ok(Json(LoginResponse {
        token,
        person_id: creds.id,
    }))
}

/// POST /api/logout - Invalidate the current token
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "No active session", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or(PortError::Unauthorized)?;
    state.db.delete_auth_session(token).await?;
    Ok(MessageResponse::new("Logged out"))
}
