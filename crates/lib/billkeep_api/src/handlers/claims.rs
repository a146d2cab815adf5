//! Warranty claim handlers. Both routes are public.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use billkeep_core::bills::{self, ClaimDraft};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::models::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ClaimQuery {
    pub email: Option<String>,
}

/// `POST /warranty-claims`
pub async fn submit_claim_handler(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ClaimDraft>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    let claim = bills::submit_warranty_claim(&*state.store, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            claim: Some(claim),
            ..ApiResponse::with_message("Warranty claim submitted successfully")
        }),
    ))
}

/// `GET /warranty-claims?email=`
pub async fn list_claims_handler(
    State(state): State<AppState>,
    Query(query): Query<ClaimQuery>,
) -> AppResult<Json<ApiResponse>> {
    let claims = bills::list_warranty_claims(&*state.store, query.email.as_deref()).await?;
    Ok(Json(ApiResponse {
        claims: Some(claims),
        ..ApiResponse::ok()
    }))
}
