//! Google sign-in: resolve a verified Google identity to exactly one local user.
//!
//! Resolution order is Google subject id, then email, then creation. Linking by
//! email has to run before creation, otherwise a user who registered with a
//! password and later signs in with Google would end up with two accounts.
//! Whichever path matched, the stored role must equal the requested one.

use tracing::{debug, info};

use super::google::{ExternalIdentity, IdentityVerifier};
use super::{AuthError, AuthSession, jwt};
use crate::models::user::normalize_email;
use crate::models::{NewUser, PublicUser, Role, User};
use crate::store::{StoreError, UserStore};

/// Display name used when Google supplies none.
pub const DEFAULT_DISPLAY_NAME: &str = "Google User";

/// Verify `credential`, then sign the matching (or new) user in.
pub async fn google_sign_in<S>(
    store: &S,
    verifier: &dyn IdentityVerifier,
    credential: Option<&str>,
    declared_role: Option<&str>,
    jwt_secret: Option<&str>,
) -> Result<AuthSession, AuthError>
where
    S: UserStore + ?Sized,
{
    let credential = credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::ValidationError("Google credential is required".into()))?;

    let identity = verifier.verify(credential).await?;
    let role = Role::declared(declared_role);
    let user = reconcile(store, identity, role).await?;

    let token = jwt::issue_token(&user.id, jwt_secret)?;
    Ok(AuthSession {
        user: PublicUser::from(&user),
        token,
    })
}

/// Find, link, or create the local user for a verified identity.
pub async fn reconcile<S>(
    store: &S,
    identity: ExternalIdentity,
    role: Role,
) -> Result<User, AuthError>
where
    S: UserStore + ?Sized,
{
    if let Some(user) = store.find_user_by_google_id(&identity.subject).await? {
        ensure_role(&user, role)?;
        debug!(user_id = %user.id, "Google identity matched by subject");
        return Ok(user);
    }

    let email = identity
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::ValidationError("Google account has no email".into()))?;

    if let Some(mut user) = store.find_user_by_email(&email).await? {
        ensure_role(&user, role)?;
        link(&mut user, &identity);
        let user = store.update_user(&user).await.map_err(conflict_as_auth)?;
        info!(user_id = %user.id, "linked Google identity to existing account");
        return Ok(user);
    }

    let mut new_user = NewUser::new(email, role);
    new_user.google_id = Some(identity.subject);
    new_user.name = identity
        .name
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
    new_user.picture = identity.picture.unwrap_or_default();

    let user = store.insert_user(new_user).await.map_err(conflict_as_auth)?;
    info!(user_id = %user.id, role = %user.role, "created account from Google identity");
    Ok(user)
}

fn ensure_role(user: &User, requested: Role) -> Result<(), AuthError> {
    if user.role != requested {
        return Err(AuthError::RoleMismatch { actual: user.role });
    }
    Ok(())
}

/// Attach the Google id; fill name and picture only where the account has none.
fn link(user: &mut User, identity: &ExternalIdentity) {
    user.google_id = Some(identity.subject.clone());
    if user.name.trim().is_empty()
        && let Some(name) = &identity.name
    {
        user.name = name.clone();
    }
    if user.picture.trim().is_empty()
        && let Some(picture) = &identity.picture
    {
        user.picture = picture.clone();
    }
    user.refresh_profile_complete();
}

fn conflict_as_auth(e: StoreError) -> AuthError {
    match e {
        StoreError::Conflict(_) => {
            AuthError::Conflict("Account was modified concurrently, please retry".into())
        }
        other => AuthError::Store(other),
    }
}
