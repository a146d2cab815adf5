//! Authentication middleware: Bearer token extraction and JWT verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use billkeep_core::auth::jwt::verify_token;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;

/// Caller identity inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the JWT,
/// and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;

    let secret = state
        .config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration("JWT_SECRET is not set".into()))?;

    let id = verify_token(token, secret)
        .and_then(|claims| Uuid::parse_str(&claims.sub).ok())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".into()))?;

    request.extensions_mut().insert(AuthenticatedUser { id });

    Ok(next.run(request).await)
}
