//! Authentication and profile request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use billkeep_core::auth::accounts::{self, Credentials, Registration};
use billkeep_core::auth::reconcile;
use billkeep_core::profile;
use serde::Deserialize;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, FormInput};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;

/// Multipart part carrying a new profile picture.
pub const PROFILE_PICTURE_PART: &str = "profilePicture";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleSignInRequest {
    /// Google ID token from the client-side sign-in flow.
    pub credential: Option<String>,
    pub role: Option<String>,
}

/// `POST /auth/register`: create a password account.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Registration>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    let session =
        accounts::register(&*state.store, body, state.config.jwt_secret.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            token: Some(session.token),
            user: Some(session.user),
            ..ApiResponse::with_message("Registration successful")
        }),
    ))
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> AppResult<Json<ApiResponse>> {
    let session = accounts::login(&*state.store, body, state.config.jwt_secret.as_deref()).await?;
    Ok(Json(ApiResponse {
        token: Some(session.token),
        user: Some(session.user),
        ..ApiResponse::with_message("Login successful")
    }))
}

/// `POST /auth/google`: sign in, link, or create from a Google ID token.
pub async fn google_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GoogleSignInRequest>,
) -> AppResult<Json<ApiResponse>> {
    let session = reconcile::google_sign_in(
        &*state.store,
        &*state.verifier,
        body.credential.as_deref(),
        body.role.as_deref(),
        state.config.jwt_secret.as_deref(),
    )
    .await?;
    Ok(Json(ApiResponse {
        token: Some(session.token),
        user: Some(session.user),
        ..ApiResponse::with_message("Google sign-in successful")
    }))
}

/// `GET /auth/me`: the caller's own profile.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse>> {
    let user = accounts::current_user(&*state.store, caller.id).await?;
    Ok(Json(ApiResponse {
        user: Some(user),
        ..ApiResponse::ok()
    }))
}

/// `PATCH /auth/profile`: partial profile update, multipart or JSON.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    mut form: FormInput,
) -> AppResult<Json<ApiResponse>> {
    let picture = form.take_file(PROFILE_PICTURE_PART);
    let outcome = profile::update_profile(
        &*state.store,
        &state.assets,
        caller.id,
        &form.fields,
        picture,
    )
    .await?;

    let message = if outcome.changed {
        "Profile updated successfully"
    } else {
        "No changes detected"
    };
    Ok(Json(ApiResponse {
        user: Some(outcome.user),
        ..ApiResponse::with_message(message)
    }))
}
