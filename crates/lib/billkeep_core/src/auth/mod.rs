//! Authentication and identity logic.
//!
//! Password hashing, token issuance, Google ID-token verification, and the
//! account flows built on them: password registration/login and Google
//! sign-in with identity reconciliation.

pub mod accounts;
pub mod google;
pub mod jwt;
pub mod password;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;
use thiserror::Error;

use crate::models::{PublicUser, Role};
use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password. Deliberately unspecific.
    #[error("Invalid credentials")]
    CredentialError,

    /// External assertion rejected (bad signature, expired, wrong audience).
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The account exists under a different role than the one requested.
    #[error("This account is registered as a {actual}. Please sign in as a {actual}.")]
    RoleMismatch { actual: Role },

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token error: {0}")]
    TokenError(String),

    /// A required secret or client id is not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An external identity service failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A signed-in user: sanitized record plus an application token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}
