//! Google ID-token verification.
//!
//! The verifier is a trait so the reconciler can run against a fake in tests.
//! The production implementation asks Google's `tokeninfo` endpoint to check
//! the signature, then checks issuer, audience and expiry locally.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::AuthError;

/// Google's token introspection endpoint.
pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by a verified external credential.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    /// Provider subject id (`sub`).
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies an opaque external credential and returns the identity it asserts.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Fails with `Unauthenticated` for a rejected credential, `Upstream` when
    /// the provider cannot be reached, `Configuration` when unconfigured.
    async fn verify(&self, credential: &str) -> Result<ExternalIdentity, AuthError>;
}

/// Response from the `tokeninfo` endpoint. Numeric claims arrive as strings.
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub iss: Option<String>,
    pub aud: Option<String>,
    pub sub: Option<String>,
    pub exp: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Check issuer, audience and expiry of a decoded Google ID token.
pub fn check_token_info(
    info: TokenInfo,
    client_id: &str,
    now_unix: i64,
) -> Result<ExternalIdentity, AuthError> {
    let issuer_ok = info
        .iss
        .as_deref()
        .is_some_and(|iss| GOOGLE_ISSUERS.contains(&iss));
    if !issuer_ok {
        return Err(AuthError::Unauthenticated("Untrusted token issuer".into()));
    }
    if info.aud.as_deref() != Some(client_id) {
        return Err(AuthError::Unauthenticated("Token audience mismatch".into()));
    }
    let exp = info
        .exp
        .as_deref()
        .and_then(|e| e.parse::<i64>().ok())
        .ok_or_else(|| AuthError::Unauthenticated("Token has no expiry".into()))?;
    if exp <= now_unix {
        return Err(AuthError::Unauthenticated("Token has expired".into()));
    }
    let subject = info
        .sub
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::Unauthenticated("Token has no subject".into()))?;

    // An unverified address must not be able to claim an existing account.
    let email = match info.email_verified.as_deref() {
        Some("false") => None,
        _ => info.email.filter(|e| !e.trim().is_empty()),
    };

    Ok(ExternalIdentity {
        subject,
        email,
        name: info.name.filter(|n| !n.trim().is_empty()),
        picture: info.picture.filter(|p| !p.trim().is_empty()),
    })
}

/// Verifies Google ID tokens for one OAuth client id.
pub struct GoogleIdTokenVerifier {
    client: Client,
    client_id: Option<String>,
    tokeninfo_url: String,
}

impl GoogleIdTokenVerifier {
    pub fn new(client: Client, client_id: Option<String>) -> Self {
        Self {
            client,
            client_id,
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }

    /// Point the verifier at a different `tokeninfo` endpoint.
    pub fn with_tokeninfo_url(mut self, url: impl Into<String>) -> Self {
        self.tokeninfo_url = url.into();
        self
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<ExternalIdentity, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::Configuration("GOOGLE_CLIENT_ID is not set".into()))?;

        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("Google tokeninfo request failed: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            debug!(%status, "Google rejected ID token");
            return Err(AuthError::Unauthenticated("Invalid Google credential".into()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Google tokeninfo returned an error");
            return Err(AuthError::Upstream(format!(
                "Google tokeninfo HTTP {status}"
            )));
        }

        let info = resp
            .json::<TokenInfo>()
            .await
            .map_err(|e| AuthError::Upstream(format!("Google tokeninfo parse error: {e}")))?;

        check_token_info(info, client_id, Utc::now().timestamp())
    }
}
