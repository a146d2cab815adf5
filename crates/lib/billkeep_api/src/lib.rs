//! # billkeep_api
//!
//! HTTP API library for Billkeep.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use billkeep_core::ai::GenerativeModel;
use billkeep_core::assets::AssetStore;
use billkeep_core::auth::google::IdentityVerifier;
use billkeep_core::store::Store;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{auth, bills, claims, health, scans};

/// Largest accepted request body (image uploads).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, bills, claims and scans.
    pub store: Arc<dyn Store>,
    /// Google ID-token verifier.
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Image storage.
    pub assets: Arc<dyn AssetStore>,
    /// Generative model for bill scanning and sales analysis.
    pub model: Arc<dyn GenerativeModel>,
    /// API configuration.
    pub config: ApiConfig,
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!(error = %e, "CORS_ORIGIN is not a valid header value, allowing any origin");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    // Public routes (no auth required)
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/google", post(auth::google_handler))
        .route(
            "/warranty-claims",
            post(claims::submit_claim_handler).get(claims::list_claims_handler),
        );

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/profile", patch(auth::update_profile_handler))
        .route(
            "/retailer/bills",
            post(bills::create_bill_handler).get(bills::list_bills_handler),
        )
        .route(
            "/retailer/bills/customer/my-bills",
            get(bills::my_bills_handler),
        )
        .route("/retailer/bills/scan", post(bills::scan_bill_handler))
        .route("/retailer/bills/analyze", post(bills::analyze_handler))
        .route(
            "/scanned-bills",
            post(scans::create_scan_handler).get(scans::list_scans_handler),
        )
        .route("/scanned-bills/{id}", delete(scans::delete_scan_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
