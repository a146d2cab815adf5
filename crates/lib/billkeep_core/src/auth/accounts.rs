//! Password registration, login, and current-user lookup.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::password::{check_password_strength, hash_password, verify_password};
use super::{AuthError, AuthSession, jwt};
use crate::models::user::{looks_like_email, normalize_email};
use crate::models::{NewUser, PublicUser, Role};
use crate::store::{StoreError, UserStore};

/// Password sign-up request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `"retailer"` registers a retailer; anything else a customer.
    pub role: Option<String>,
    pub phone: String,
    #[serde(alias = "shopAddress")]
    pub address: String,
    pub shop_name: String,
    pub gst_number: String,
    pub pan_number: String,
}

/// Password sign-in request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Login surface the caller used; checked against the stored role when present.
    pub role: Option<String>,
}

/// Register a password account and sign it in.
pub async fn register<S>(
    store: &S,
    registration: Registration,
    jwt_secret: Option<&str>,
) -> Result<AuthSession, AuthError>
where
    S: UserStore + ?Sized,
{
    let name = registration.name.trim().to_string();
    let email = normalize_email(&registration.email);

    let mut problems = Vec::new();
    if name.is_empty() {
        problems.push("Name is required".to_string());
    }
    if email.is_empty() {
        problems.push("Email is required".to_string());
    } else if !looks_like_email(&email) {
        problems.push("Email is not valid".to_string());
    }
    if let Err(AuthError::ValidationError(msg)) = check_password_strength(&registration.password)
    {
        problems.push(msg);
    }
    if !problems.is_empty() {
        return Err(AuthError::ValidationError(problems.join(", ")));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict("Email already registered".into()));
    }

    let role = Role::declared(registration.role.as_deref());
    let mut new_user = NewUser::new(email.clone(), role);
    new_user.password_hash = Some(hash_password(&registration.password)?);
    new_user.name = name;
    new_user.phone = registration.phone.trim().to_string();
    new_user.address = registration.address.trim().to_string();
    if role == Role::Retailer {
        new_user.shop_name = registration.shop_name.trim().to_string();
        new_user.gst_number = registration.gst_number.trim().to_uppercase();
        new_user.pan_number = registration.pan_number.trim().to_uppercase();
    }

    // A concurrent registration can still win the race at the unique index.
    let user = store.insert_user(new_user).await.map_err(|e| match e {
        StoreError::Conflict(_) => AuthError::Conflict("Email already registered".into()),
        other => AuthError::Store(other),
    })?;

    info!(user_id = %user.id, role = %user.role, "registered password account");

    let token = jwt::issue_token(&user.id, jwt_secret)?;
    Ok(AuthSession {
        user: PublicUser::from(&user),
        token,
    })
}

/// Sign in with email and password.
pub async fn login<S>(
    store: &S,
    credentials: Credentials,
    jwt_secret: Option<&str>,
) -> Result<AuthSession, AuthError>
where
    S: UserStore + ?Sized,
{
    let email = normalize_email(&credentials.email);
    if email.is_empty() || credentials.password.is_empty() {
        return Err(AuthError::ValidationError(
            "Email and password are required".into(),
        ));
    }

    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or(AuthError::CredentialError)?;

    if !verify_password(&credentials.password, user.password_hash.as_deref()) {
        return Err(AuthError::CredentialError);
    }

    if let Some(declared) = credentials.role.as_deref()
        && let Ok(requested) = declared.parse::<Role>()
        && requested != user.role
    {
        return Err(AuthError::RoleMismatch { actual: user.role });
    }

    let token = jwt::issue_token(&user.id, jwt_secret)?;
    Ok(AuthSession {
        user: PublicUser::from(&user),
        token,
    })
}

/// Fetch the sanitized record of an authenticated caller.
pub async fn current_user<S>(store: &S, user_id: Uuid) -> Result<PublicUser, AuthError>
where
    S: UserStore + ?Sized,
{
    store
        .find_user_by_id(user_id)
        .await?
        .map(|u| PublicUser::from(&u))
        .ok_or_else(|| AuthError::NotFound("User not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::StaleEmailStore;
    use crate::store::MemoryStore;

    const SECRET: Option<&str> = Some("test-secret");

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: "Kiran".into(),
            email: email.into(),
            password: password.into(),
            ..Registration::default()
        }
    }

    #[tokio::test]
    async fn short_password_is_rejected_and_nothing_stored() {
        let store = MemoryStore::new();
        let err = register(&store, registration("kiran@example.com", "12345"), SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(m) if m.contains("at least 6")));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let store = MemoryStore::new();
        register(&store, registration("kiran@example.com", "secret1"), SECRET)
            .await
            .unwrap();
        let err = register(&store, registration("KIRAN@Example.com", "secret2"), SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn losing_a_registration_race_is_a_conflict() {
        let store = StaleEmailStore {
            inner: MemoryStore::new(),
        };
        register(&store, registration("kiran@example.com", "secret1"), SECRET)
            .await
            .unwrap();

        let err = register(&store, registration("Kiran@example.com", "secret2"), SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(m) if m == "Email already registered"));
        assert_eq!(store.inner.user_count().await, 1);
    }

    #[tokio::test]
    async fn registration_normalizes_email_and_defaults_role() {
        let store = MemoryStore::new();
        let mut req = registration("  Kiran@Example.com ", "secret1");
        req.role = Some("admin".into());
        let session = register(&store, req, SECRET).await.unwrap();
        assert_eq!(session.user.email, "kiran@example.com");
        assert_eq!(session.user.role, Role::Customer);
        assert!(session.user.has_password);
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn retailer_registration_keeps_shop_fields() {
        let store = MemoryStore::new();
        let mut req = registration("shop@example.com", "secret1");
        req.role = Some("retailer".into());
        req.shop_name = "Kiran Mobiles".into();
        req.gst_number = "22aaaaa0000a1z5".into();
        let session = register(&store, req, SECRET).await.unwrap();
        assert_eq!(session.user.role, Role::Retailer);
        assert_eq!(session.user.shop_name, "Kiran Mobiles");
        assert_eq!(session.user.gst_number, "22AAAAA0000A1Z5");
    }

    #[tokio::test]
    async fn registration_without_secret_fails_closed() {
        let store = MemoryStore::new();
        let err = register(&store, registration("kiran@example.com", "secret1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[tokio::test]
    async fn login_checks_password_and_role() {
        let store = MemoryStore::new();
        register(&store, registration("kiran@example.com", "secret1"), SECRET)
            .await
            .unwrap();

        let ok = login(
            &store,
            Credentials {
                email: "Kiran@example.com".into(),
                password: "secret1".into(),
                role: None,
            },
            SECRET,
        )
        .await
        .unwrap();
        assert_eq!(ok.user.email, "kiran@example.com");

        let wrong = login(
            &store,
            Credentials {
                email: "kiran@example.com".into(),
                password: "nope".into(),
                role: None,
            },
            SECRET,
        )
        .await
        .unwrap_err();
        assert!(matches!(wrong, AuthError::CredentialError));

        let mismatch = login(
            &store,
            Credentials {
                email: "kiran@example.com".into(),
                password: "secret1".into(),
                role: Some("retailer".into()),
            },
            SECRET,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            mismatch,
            AuthError::RoleMismatch {
                actual: Role::Customer
            }
        ));
    }

    #[tokio::test]
    async fn google_only_account_cannot_password_login() {
        let store = MemoryStore::new();
        let mut new = NewUser::new("g@example.com", Role::Customer);
        new.google_id = Some("g-123".into());
        store.insert_user(new).await.unwrap();

        let err = login(
            &store,
            Credentials {
                email: "g@example.com".into(),
                password: "whatever".into(),
                role: None,
            },
            SECRET,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::CredentialError));
    }

    #[tokio::test]
    async fn current_user_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = current_user(&store, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}
