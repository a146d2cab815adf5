//! Partial profile updates.
//!
//! Every editable text field is described once in [`PROFILE_FIELDS`] and the
//! same rule applies to all of them: a candidate is applied only when present,
//! non-empty after normalization, and different from the stored value.
//! Password and picture are the two special candidates.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::assets::{self, AssetError, AssetStore, AssetUpload, PROFILE_PICTURE_FOLDER};
use crate::auth::AuthError;
use crate::auth::password::{check_password_strength, hash_password, verify_password};
use crate::models::{ProfileField, PublicUser, Role};
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One editable profile field.
pub struct FieldSpec {
    pub field: ProfileField,
    /// Request keys, canonical first.
    pub keys: &'static [&'static str],
    pub retailer_only: bool,
    pub normalize: fn(&str) -> String,
    pub validate: Option<fn(&str) -> Result<(), String>>,
}

pub const PROFILE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: ProfileField::Name,
        keys: &["name"],
        retailer_only: false,
        normalize: trimmed,
        validate: Some(validate_name),
    },
    FieldSpec {
        field: ProfileField::Phone,
        keys: &["phone"],
        retailer_only: false,
        normalize: trimmed,
        validate: Some(validate_phone),
    },
    FieldSpec {
        field: ProfileField::Address,
        keys: &["address", "shopAddress"],
        retailer_only: false,
        normalize: trimmed,
        validate: None,
    },
    FieldSpec {
        field: ProfileField::ShopName,
        keys: &["shopName"],
        retailer_only: true,
        normalize: trimmed,
        validate: None,
    },
    FieldSpec {
        field: ProfileField::GstNumber,
        keys: &["gstNumber"],
        retailer_only: true,
        normalize: upper_trimmed,
        validate: Some(validate_gst),
    },
    FieldSpec {
        field: ProfileField::PanNumber,
        keys: &["panNumber"],
        retailer_only: true,
        normalize: upper_trimmed,
        validate: Some(validate_pan),
    },
];

fn trimmed(raw: &str) -> String {
    raw.trim().to_string()
}

fn upper_trimmed(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().count() > 100 {
        return Err("Name must be at most 100 characters".into());
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), String> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !allowed || !(7..=15).contains(&digits) {
        return Err("Phone number is not valid".into());
    }
    Ok(())
}

fn validate_gst(gst: &str) -> Result<(), String> {
    if gst.len() != 15 || !gst.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("GST number must be 15 letters or digits".into());
    }
    Ok(())
}

/// Five letters, four digits, one letter.
fn validate_pan(pan: &str) -> Result<(), String> {
    let b = pan.as_bytes();
    let ok = b.len() == 10
        && b[..5].iter().all(u8::is_ascii_uppercase)
        && b[5..9].iter().all(u8::is_ascii_digit)
        && b[9].is_ascii_uppercase();
    if !ok {
        return Err("PAN number is not valid".into());
    }
    Ok(())
}

/// Result of a profile update.
#[derive(Debug, Clone)]
pub struct ProfileOutcome {
    pub user: PublicUser,
    /// `false` when nothing differed and no write happened.
    pub changed: bool,
}

/// Apply the candidates that differ from the stored profile, upload a new
/// picture if one was sent, and persist in a single write.
pub async fn update_profile<S>(
    store: &S,
    assets: &Arc<dyn AssetStore>,
    user_id: Uuid,
    candidates: &HashMap<String, String>,
    picture: Option<AssetUpload>,
) -> Result<ProfileOutcome, ProfileError>
where
    S: UserStore + ?Sized,
{
    let current = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(ProfileError::NotFound)?;

    let mut next = current.clone();
    let mut changed = Vec::new();
    let mut problems = Vec::new();

    for spec in PROFILE_FIELDS {
        if spec.retailer_only && current.role != Role::Retailer {
            continue;
        }
        let Some(raw) = spec.keys.iter().find_map(|k| candidates.get(*k)) else {
            continue;
        };
        let value = (spec.normalize)(raw);
        if value.is_empty() || value == current.profile_field(spec.field) {
            continue;
        }
        if let Some(validate) = spec.validate
            && let Err(problem) = validate(&value)
        {
            problems.push(problem);
            continue;
        }
        *next.profile_field_mut(spec.field) = value;
        changed.push(spec.keys[0]);
    }

    if let Some(password) = candidates.get("password").filter(|p| !p.is_empty()) {
        match check_password_strength(password) {
            Err(AuthError::ValidationError(problem)) => problems.push(problem),
            Err(other) => return Err(other.into()),
            Ok(()) if verify_password(password, current.password_hash.as_deref()) => {}
            Ok(()) => {
                next.password_hash = Some(hash_password(password)?);
                changed.push("password");
            }
        }
    }

    if !problems.is_empty() {
        return Err(ProfileError::Validation(problems.join(", ")));
    }

    let uploaded = match picture {
        Some(file) => {
            file.ensure_supported_image()?;
            let stored = assets.upload(&file, PROFILE_PICTURE_FOLDER).await?;
            next.picture = stored.url;
            next.picture_public_id = stored.public_id.clone();
            changed.push("picture");
            Some(stored.public_id)
        }
        None => None,
    };

    if changed.is_empty() {
        return Ok(ProfileOutcome {
            user: PublicUser::from(&current),
            changed: false,
        });
    }

    next.refresh_profile_complete();
    let saved = match store.update_user(&next).await {
        Ok(saved) => saved,
        Err(e) => {
            if let Some(public_id) = uploaded {
                assets::delete_detached(Arc::clone(assets), public_id);
            }
            return Err(e.into());
        }
    };

    if uploaded.is_some() && !current.picture_public_id.is_empty() {
        assets::delete_detached(Arc::clone(assets), current.picture_public_id.clone());
    }

    info!(user_id = %saved.id, fields = ?changed, "profile updated");
    Ok(ProfileOutcome {
        user: PublicUser::from(&saved),
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::assets::StoredAsset;
    use crate::models::{NewUser, User};
    use crate::store::{MemoryStore, StoreResult};

    #[derive(Default)]
    struct RecordingAssets {
        uploads: AtomicUsize,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssetStore for RecordingAssets {
        async fn upload(
            &self,
            _file: &AssetUpload,
            folder: &str,
        ) -> Result<StoredAsset, AssetError> {
            let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(StoredAsset {
                url: format!("https://cdn.example.com/{folder}/pic-{n}.png"),
                public_id: format!("{folder}/pic-{n}"),
            })
        }

        async fn delete(&self, public_id: &str) -> Result<(), AssetError> {
            self.deleted.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    /// Counts writes; optionally fails them.
    struct WriteCountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
        fail_writes: bool,
    }

    impl WriteCountingStore {
        fn new(fail_writes: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                writes: AtomicUsize::new(0),
                fail_writes,
            }
        }
    }

    #[async_trait]
    impl UserStore for WriteCountingStore {
        async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
            self.inner.insert_user(user).await
        }
        async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
            self.inner.find_user_by_id(id).await
        }
        async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.inner.find_user_by_email(email).await
        }
        async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
            self.inner.find_user_by_google_id(google_id).await
        }
        async fn update_user(&self, user: &User) -> StoreResult<User> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(StoreError::NotFound);
            }
            self.inner.update_user(user).await
        }
    }

    async fn seed(store: &WriteCountingStore, role: Role) -> User {
        let mut new = NewUser::new("asha@example.com", role);
        new.password_hash = Some(hash_password("secret1").unwrap());
        new.name = "Asha".into();
        new.phone = "9876543210".into();
        store.insert_user(new).await.unwrap()
    }

    fn candidates(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn recording() -> (Arc<RecordingAssets>, Arc<dyn AssetStore>) {
        let rec = Arc::new(RecordingAssets::default());
        let dyn_assets: Arc<dyn AssetStore> = rec.clone();
        (rec, dyn_assets)
    }

    async fn wait_for_deletions(rec: &RecordingAssets, n: usize) -> Vec<String> {
        for _ in 0..100 {
            if rec.deleted.lock().unwrap().len() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        rec.deleted.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn identical_values_do_not_write() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        let (_, assets) = recording();

        let out = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("name", " Asha "), ("phone", "9876543210"), ("password", "secret1")]),
            None,
        )
        .await
        .unwrap();
        assert!(!out.changed);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_candidates_are_ignored() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        let (_, assets) = recording();

        let out = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("name", "   "), ("password", "")]),
            None,
        )
        .await
        .unwrap();
        assert!(!out.changed);
        assert_eq!(out.user.name, "Asha");
    }

    #[tokio::test]
    async fn changed_fields_are_written_once_and_completeness_refreshed() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        assert!(!user.profile_complete);
        let (_, assets) = recording();

        let out = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("shopAddress", "4 Park Street")]),
            None,
        )
        .await
        .unwrap();
        assert!(out.changed);
        assert_eq!(out.user.address, "4 Park Street");
        assert!(out.user.profile_complete);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retailer_fields_from_customer_are_ignored() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        let (_, assets) = recording();

        let out = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("shopName", "Not Mine"), ("gstNumber", "bad")]),
            None,
        )
        .await
        .unwrap();
        assert!(!out.changed);
        assert_eq!(out.user.shop_name, "");
    }

    #[tokio::test]
    async fn retailer_fields_are_normalized() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Retailer).await;
        let (_, assets) = recording();

        let out = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("gstNumber", " 22aaaaa0000a1z5 "), ("panNumber", "abcde1234f")]),
            None,
        )
        .await
        .unwrap();
        assert_eq!(out.user.gst_number, "22AAAAA0000A1Z5");
        assert_eq!(out.user.pan_number, "ABCDE1234F");
    }

    #[tokio::test]
    async fn validation_problems_are_aggregated() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Retailer).await;
        let (_, assets) = recording();

        let err = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("phone", "call me"), ("password", "123"), ("panNumber", "x")]),
            None,
        )
        .await
        .unwrap_err();
        let message = match err {
            ProfileError::Validation(message) => message,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(message.contains("Phone number is not valid"));
        assert!(message.contains("PAN number is not valid"));
        assert!(message.contains("at least 6"));
        assert!(message.contains(", "));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn new_password_is_rehashed() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        let (_, assets) = recording();

        let out = update_profile(
            &store,
            &assets,
            user.id,
            &candidates(&[("password", "brand-new")]),
            None,
        )
        .await
        .unwrap();
        assert!(out.changed);
        let stored = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("brand-new", stored.password_hash.as_deref()));
        assert!(!verify_password("secret1", stored.password_hash.as_deref()));
    }

    #[tokio::test]
    async fn unsupported_picture_is_rejected_before_upload() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        let (rec, assets) = recording();

        let err = update_profile(
            &store,
            &assets,
            user.id,
            &HashMap::new(),
            Some(AssetUpload::new("me.gif", None, vec![1])),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Asset(AssetError::UnsupportedType(ref e)) if e == ".gif"
        ));
        assert_eq!(rec.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn replacing_picture_deletes_previous_asset() {
        let store = WriteCountingStore::new(false);
        let user = seed(&store, Role::Customer).await;
        let (rec, assets) = recording();
        let photo = || Some(AssetUpload::new("me.png", None, vec![1, 2]));

        let first = update_profile(&store, &assets, user.id, &HashMap::new(), photo())
            .await
            .unwrap();
        assert!(first.user.picture.ends_with("pic-1.png"));

        let second = update_profile(&store, &assets, user.id, &HashMap::new(), photo())
            .await
            .unwrap();
        assert!(second.user.picture.ends_with("pic-2.png"));

        let deleted = wait_for_deletions(&rec, 1).await;
        assert_eq!(deleted, vec!["profile-pictures/pic-1".to_string()]);
    }

    #[tokio::test]
    async fn failed_write_cleans_up_new_upload() {
        let store = WriteCountingStore::new(true);
        let user = seed(&store, Role::Customer).await;
        let (rec, assets) = recording();

        let err = update_profile(
            &store,
            &assets,
            user.id,
            &HashMap::new(),
            Some(AssetUpload::new("me.webp", None, vec![1])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProfileError::Store(_)));

        let deleted = wait_for_deletions(&rec, 1).await;
        assert_eq!(deleted, vec!["profile-pictures/pic-1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = WriteCountingStore::new(false);
        let (_, assets) = recording();
        let err = update_profile(&store, &assets, Uuid::now_v7(), &HashMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound));
    }
}
