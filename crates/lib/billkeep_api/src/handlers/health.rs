//! Liveness endpoint.

use axum::Json;
use serde_json::json;

use crate::models::ApiResponse;

/// `GET /health`
pub async fn health_handler() -> Json<ApiResponse> {
    Json(ApiResponse {
        data: Some(json!({ "version": billkeep_core::version() })),
        ..ApiResponse::with_message("ok")
    })
}
