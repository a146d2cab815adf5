//! Retailer bill handlers, including AI scanning and sales analysis.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use billkeep_core::ai;
use billkeep_core::auth::accounts;
use billkeep_core::bills::{self, BillDraft};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, FormInput};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;

/// Multipart part carrying a bill photo.
pub const BILL_IMAGE_PART: &str = "billImage";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    #[serde(alias = "salesData")]
    pub summary: serde_json::Value,
}

/// `POST /retailer/bills`
pub async fn create_bill_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    ApiJson(draft): ApiJson<BillDraft>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    let bill = bills::create_bill(&*state.store, caller.id, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            bill: Some(bill),
            ..ApiResponse::with_message("Bill created successfully")
        }),
    ))
}

/// `GET /retailer/bills`: bills the caller issued.
pub async fn list_bills_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse>> {
    let found = bills::list_bills_for_retailer(&*state.store, caller.id).await?;
    Ok(Json(ApiResponse {
        bills: Some(found),
        ..ApiResponse::ok()
    }))
}

/// `GET /retailer/bills/customer/my-bills`: bills issued to the caller's email.
pub async fn my_bills_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse>> {
    let user = accounts::current_user(&*state.store, caller.id).await?;
    let found = bills::list_bills_for_customer(&*state.store, &user.email).await?;
    Ok(Json(ApiResponse {
        bills: Some(found),
        ..ApiResponse::ok()
    }))
}

/// `POST /retailer/bills/scan`: read bill fields off an uploaded photo.
pub async fn scan_bill_handler(
    State(state): State<AppState>,
    mut form: FormInput,
) -> AppResult<Json<ApiResponse>> {
    let image = form
        .take_file(BILL_IMAGE_PART)
        .ok_or_else(|| AppError::Validation("Bill image is required".into()))?;
    let extracted = ai::extract_bill(&*state.model, &image).await?;
    let data =
        serde_json::to_value(&extracted).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(ApiResponse {
        data: Some(data),
        ..ApiResponse::with_message("Bill scanned successfully")
    }))
}

/// `POST /retailer/bills/analyze`: business insights from a sales summary.
pub async fn analyze_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnalyzeRequest>,
) -> AppResult<Json<ApiResponse>> {
    let insights = ai::analyze_sales(&*state.model, &body.summary).await?;
    Ok(Json(ApiResponse {
        data: Some(json!({ "insights": insights })),
        ..ApiResponse::ok()
    }))
}
