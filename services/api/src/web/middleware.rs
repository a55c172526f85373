//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use recipe_book_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentPerson};

/// Reads the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that validates the bearer token and resolves it to the caller.
///
/// If valid, inserts a `CurrentPerson` into request extensions for handlers to use.
/// If invalid, expired or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        debug!("Request without a bearer token");
        return ApiError::Port(PortError::Unauthorized).into_response();
    };

    let person_id = match state.db.validate_auth_session(token).await {
        Ok(person_id) => person_id,
        Err(PortError::Unauthorized) | Err(PortError::NotFound(_)) => {
            return ApiError::Port(PortError::Unauthorized).into_response()
        }
        Err(e) => return ApiError::Port(e).into_response(),
    };

    req.extensions_mut().insert(CurrentPerson(person_id));
    next.run(req).await
}
