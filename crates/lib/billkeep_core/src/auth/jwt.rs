//! JWT token generation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::AuthError;
use crate::models::TokenClaims;

/// Application token lifetime: 30 days.
pub const TOKEN_EXPIRY_DAYS: i64 = 30;

/// Issue a signed HS256 token for `user_id`, valid for 30 days.
///
/// Refuses to sign when no secret is configured: a token signed with an empty
/// key could never be trusted on the way back in.
pub fn issue_token(user_id: &Uuid, secret: Option<&str>) -> Result<String, AuthError> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::Configuration("JWT_SECRET is not set".into()))?;

    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::days(TOKEN_EXPIRY_DAYS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a token, returning the claims on success.
pub fn verify_token(token: &str, secret: &str) -> Option<TokenClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<TokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Read the signing secret from `JWT_SECRET`. Empty counts as unset.
pub fn resolve_jwt_secret() -> Option<String> {
    std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let id = Uuid::now_v7();
        let token = issue_token(&id, Some("test-secret")).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, id.to_string());
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, TOKEN_EXPIRY_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let id = Uuid::now_v7();
        assert!(matches!(
            issue_token(&id, None),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            issue_token(&id, Some("")),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = issue_token(&Uuid::now_v7(), Some("secret-a")).unwrap();
        assert!(verify_token(&token, "secret-b").is_none());
        assert!(verify_token("garbage", "secret-a").is_none());
    }
}
