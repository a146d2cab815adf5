//! Billkeep API server binary.
//!
//! Connects to PostgreSQL, applies migrations, wires the external clients
//! (Google, Cloudinary, Gemini) and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use billkeep_api::AppState;
use billkeep_api::config::ApiConfig;
use billkeep_core::ai::GeminiClient;
use billkeep_core::assets::CloudinaryAssetStore;
use billkeep_core::auth::google::GoogleIdTokenVerifier;
use billkeep_core::store::PgStore;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "billkeep_api_server", about = "Billkeep API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/billkeep"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 10)]
    max_connections: u32,

    /// Timeout for outbound HTTP calls, in seconds.
    #[arg(long, default_value_t = 60)]
    http_timeout_secs: u64,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,billkeep_api=debug,billkeep_core=debug")),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        pg_connection_url: args.database_url,
        ..ApiConfig::from_env()
    };

    info!(bind_addr = %config.bind_addr, "starting billkeep_api_server");
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; sign-in and protected routes will fail");
    }
    if config.google_client_id.is_none() {
        warn!("GOOGLE_CLIENT_ID is not set; Google sign-in will fail");
    }
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; bill scanning and analysis will fail");
    }

    info!(max_connections = args.max_connections, "configuring connection pool");
    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    billkeep_core::migrate::migrate(&pool).await?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.http_timeout_secs))
        .build()?;

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        verifier: Arc::new(GoogleIdTokenVerifier::new(
            http.clone(),
            config.google_client_id.clone(),
        )),
        assets: Arc::new(CloudinaryAssetStore::new(
            http.clone(),
            config.cloudinary.clone(),
        )),
        model: Arc::new(GeminiClient::new(
            http,
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )),
        config: config.clone(),
    };

    let app = billkeep_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
