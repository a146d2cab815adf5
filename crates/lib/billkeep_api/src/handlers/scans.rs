//! Scanned bill handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use billkeep_core::bills;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::FormInput;
use crate::handlers::bills::BILL_IMAGE_PART;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;

/// `POST /scanned-bills`: `billImage` file, optional `note`, optional `extract` flag.
pub async fn create_scan_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    mut form: FormInput,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    let image = form
        .take_file(BILL_IMAGE_PART)
        .ok_or_else(|| AppError::Validation("Bill image is required".into()))?;
    let note = form.field("note").map(str::to_string);
    let extract = form.flag("extract");

    let scan = bills::create_scanned_bill(
        &*state.store,
        &state.assets,
        &*state.model,
        caller.id,
        image,
        note,
        extract,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            scanned_bill: Some(scan),
            ..ApiResponse::with_message("Scanned bill saved")
        }),
    ))
}

/// `GET /scanned-bills`
pub async fn list_scans_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse>> {
    let scans = bills::list_scanned_bills(&*state.store, caller.id).await?;
    Ok(Json(ApiResponse {
        scanned_bills: Some(scans),
        ..ApiResponse::ok()
    }))
}

/// `DELETE /scanned-bills/{id}`
pub async fn delete_scan_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse>> {
    // A malformed id cannot name an existing scan.
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::NotFound("Scanned bill not found".into()))?;
    bills::delete_scanned_bill(&*state.store, &state.assets, caller.id, id).await?;
    Ok(Json(ApiResponse::with_message("Scanned bill deleted")))
}
