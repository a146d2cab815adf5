//! API server configuration.

use billkeep_core::assets::CloudinaryConfig;
use billkeep_core::auth::jwt::resolve_jwt_secret;

/// Configuration for the API server.
#[derive(Clone, Debug, Default)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:5000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret. Token issuance and verification fail without it.
    pub jwt_secret: Option<String>,
    /// OAuth client id Google ID tokens must be issued for.
    pub google_client_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub cloudinary: CloudinaryConfig,
    /// Allowed browser origin. Any origin when unset.
    pub cors_origin: Option<String>,
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                  |
    /// |--------------------|------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:5000`                         |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/billkeep`     |
    /// | `JWT_SECRET`       | none (auth endpoints fail)               |
    /// | `GOOGLE_CLIENT_ID` | none (Google sign-in fails)              |
    /// | `GEMINI_API_KEY`   | none (scan/analyze fail)                 |
    /// | `GEMINI_MODEL`     | `gemini-2.0-flash`                       |
    /// | `CLOUDINARY_*`     | none (uploads fail)                      |
    /// | `CORS_ORIGIN`      | any                                      |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/billkeep".into()),
            jwt_secret: resolve_jwt_secret(),
            google_client_id: optional_env("GOOGLE_CLIENT_ID"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL"),
            cloudinary: CloudinaryConfig::from_env(),
            cors_origin: optional_env("CORS_ORIGIN"),
        }
    }
}
