//! Application error types.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use billkeep_core::ai::AiError;
use billkeep_core::assets::AssetError;
use billkeep_core::auth::AuthError;
use billkeep_core::bills::BillError;
use billkeep_core::models::Role;
use billkeep_core::profile::ProfileError;
use billkeep_core::store::StoreError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("This account is registered as a {0}. Please sign in as a {0}.")]
    RoleMismatch(Role),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::RoleMismatch(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            AppError::Configuration(detail) => {
                error!(%detail, "server misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server is not configured for this operation".to_string(),
                )
            }
            AppError::Upstream(detail) => {
                error!(%detail, "external service failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An external service failed, please try again later".to_string(),
                )
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        let actual_role = match &self {
            AppError::RoleMismatch(role) => Some(*role),
            _ => None,
        };
        let body = Json(ErrorResponse {
            success: false,
            message,
            actual_role,
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => AppError::Conflict("Resource already exists".into()),
            StoreError::MissingReference(_) => {
                AppError::NotFound("Referenced record not found".into())
            }
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::Corrupt(_) | StoreError::Db(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => {
                AppError::Unauthorized("Invalid email or password".into())
            }
            AuthError::Unauthenticated(msg) => AppError::Unauthorized(msg),
            // Raised only when signing a token fails.
            AuthError::TokenError(msg) => AppError::Internal(msg),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::RoleMismatch { actual } => AppError::RoleMismatch(actual),
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::NotFound(msg) => AppError::NotFound(msg),
            AuthError::Configuration(msg) => AppError::Configuration(msg),
            AuthError::Upstream(msg) => AppError::Upstream(msg),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AssetError> for AppError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::UnsupportedType(_) | AssetError::Empty => {
                AppError::Validation(e.to_string())
            }
            AssetError::Configuration(msg) => AppError::Configuration(msg),
            AssetError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}

impl From<AiError> for AppError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::InvalidInput(msg) => AppError::Validation(msg),
            AiError::Asset(e) => AppError::from(e),
            AiError::Configuration(msg) => AppError::Configuration(msg),
            AiError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::Validation(msg) => AppError::Validation(msg),
            ProfileError::NotFound => AppError::NotFound("User not found".into()),
            ProfileError::Asset(e) => AppError::from(e),
            ProfileError::Auth(e) => AppError::from(e),
            ProfileError::Store(e) => AppError::from(e),
        }
    }
}

impl From<BillError> for AppError {
    fn from(e: BillError) -> Self {
        match e {
            BillError::Validation(msg) => AppError::Validation(msg),
            BillError::Forbidden(msg) => AppError::Forbidden(msg),
            BillError::Conflict(msg) => AppError::Conflict(msg),
            BillError::NotFound(msg) => AppError::NotFound(msg),
            BillError::Asset(e) => AppError::from(e),
            BillError::Ai(e) => AppError::from(e),
            BillError::Store(e) => AppError::from(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(e: MultipartRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn role_mismatch_carries_actual_role() {
        let resp = AppError::from(AuthError::RoleMismatch {
            actual: Role::Retailer,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["actualRole"], "retailer");
        assert_eq!(
            json["message"],
            "This account is registered as a retailer. Please sign in as a retailer."
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let resp = AppError::Configuration("JWT_SECRET is not set".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert!(!json["message"].as_str().unwrap().contains("JWT_SECRET"));
        assert!(json.get("actualRole").is_none());
    }

    #[tokio::test]
    async fn token_signing_failure_is_a_server_error() {
        let resp = AppError::from(AuthError::TokenError("InvalidKeyFormat".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert!(!json["message"].as_str().unwrap().contains("InvalidKeyFormat"));
    }

    #[test]
    fn store_conflict_maps_to_409() {
        let err = AppError::from(StoreError::Conflict("bills_bill_number_key".into()));
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
