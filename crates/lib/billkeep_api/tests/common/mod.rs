//! Shared harness: router over the in-memory store with fake collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use billkeep_api::{AppState, config::ApiConfig};
use billkeep_core::ai::{AiError, GenerativeModel};
use billkeep_core::assets::{AssetError, AssetStore, AssetUpload, StoredAsset};
use billkeep_core::auth::AuthError;
use billkeep_core::auth::google::{ExternalIdentity, IdentityVerifier};
use billkeep_core::models::{
    Bill, NewBill, NewScannedBill, NewUser, NewWarrantyClaim, ScannedBill, User, WarrantyClaim,
};
use billkeep_core::store::{
    BillStore, ClaimStore, MemoryStore, ScanStore, Store, StoreResult, UserStore,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "billkeep-test-boundary";

pub struct FakeVerifier {
    pub identities: Mutex<HashMap<String, ExternalIdentity>>,
}

impl FakeVerifier {
    pub fn accept(&self, credential: &str, subject: &str, email: &str) {
        self.identities.lock().unwrap().insert(
            credential.to_string(),
            ExternalIdentity {
                subject: subject.into(),
                email: Some(email.into()),
                name: Some("Test Person".into()),
                picture: None,
            },
        );
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, credential: &str) -> Result<ExternalIdentity, AuthError> {
        self.identities
            .lock()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or_else(|| AuthError::Unauthenticated("Invalid Google credential".into()))
    }
}

#[derive(Default)]
pub struct FakeAssets {
    pub uploads: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn upload(&self, file: &AssetUpload, folder: &str) -> Result<StoredAsset, AssetError> {
        let mut uploads = self.uploads.lock().unwrap();
        let public_id = format!("{folder}/{}-{}", uploads.len() + 1, file.file_name);
        uploads.push(public_id.clone());
        Ok(StoredAsset {
            url: format!("https://cdn.example.com/{public_id}"),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), AssetError> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub struct FakeModel {
    pub reply: Mutex<String>,
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(
        &self,
        _prompt: &str,
        _image: Option<&AssetUpload>,
    ) -> Result<String, AiError> {
        Ok(self.reply.lock().unwrap().clone())
    }
}

/// Email lookups always miss, as if another request inserted the same email
/// between the check and the write. Everything else reaches `inner`.
pub struct StaleEmailStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl UserStore for StaleEmailStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_google_id(google_id).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        self.inner.update_user(user).await
    }
}

#[async_trait]
impl BillStore for StaleEmailStore {
    async fn insert_bill(&self, bill: NewBill) -> StoreResult<Bill> {
        self.inner.insert_bill(bill).await
    }

    async fn bills_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Bill>> {
        self.inner.bills_for_owner(owner_id).await
    }

    async fn bills_for_customer_email(&self, email: &str) -> StoreResult<Vec<Bill>> {
        self.inner.bills_for_customer_email(email).await
    }
}

#[async_trait]
impl ClaimStore for StaleEmailStore {
    async fn insert_claim(&self, claim: NewWarrantyClaim) -> StoreResult<WarrantyClaim> {
        self.inner.insert_claim(claim).await
    }

    async fn claims_for_email(&self, email: &str) -> StoreResult<Vec<WarrantyClaim>> {
        self.inner.claims_for_email(email).await
    }
}

#[async_trait]
impl ScanStore for StaleEmailStore {
    async fn insert_scan(&self, scan: NewScannedBill) -> StoreResult<ScannedBill> {
        self.inner.insert_scan(scan).await
    }

    async fn scans_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<ScannedBill>> {
        self.inner.scans_for_owner(owner_id).await
    }

    async fn delete_scan(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<ScannedBill>> {
        self.inner.delete_scan(owner_id, id).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub verifier: Arc<FakeVerifier>,
    pub assets: Arc<FakeAssets>,
    pub model: Arc<FakeModel>,
}

pub fn test_app() -> TestApp {
    test_app_with_secret(Some(JWT_SECRET))
}

pub fn test_app_with_secret(secret: Option<&str>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    build(store.clone(), store, secret)
}

/// Router whose store never finds users by email.
pub fn test_app_with_stale_email_lookups() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let stale = Arc::new(StaleEmailStore {
        inner: store.clone(),
    });
    build(stale, store, Some(JWT_SECRET))
}

fn build(state_store: Arc<dyn Store>, store: Arc<MemoryStore>, secret: Option<&str>) -> TestApp {
    let verifier = Arc::new(FakeVerifier {
        identities: Mutex::new(HashMap::new()),
    });
    let assets = Arc::new(FakeAssets::default());
    let model = Arc::new(FakeModel {
        reply: Mutex::new("{}".into()),
    });

    let state = AppState {
        store: state_store,
        verifier: verifier.clone(),
        assets: assets.clone(),
        model: model.clone(),
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            jwt_secret: secret.map(str::to_string),
            ..ApiConfig::default()
        },
    };

    TestApp {
        router: billkeep_api::router(state),
        store,
        verifier,
        assets,
        model,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("parse JSON")
        };
        (status, json)
    }

    /// Register a password account and return its token.
    pub async fn register(&self, email: &str, role: &str) -> String {
        let (status, json) = self
            .send(json_request(
                "POST",
                "/auth/register",
                None,
                serde_json::json!({
                    "name": "Test Person",
                    "email": email,
                    "password": "secret1",
                    "role": role,
                    "shopName": "Test Shop",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
        json["token"].as_str().expect("token").to_string()
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// One part of a multipart body: `(name, Some(file name), bytes)` for files,
/// `(name, None, text)` for plain fields.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    (name, None, value.as_bytes())
}

pub fn file<'a>(name: &'a str, file_name: &'a str, bytes: &'a [u8]) -> Part<'a> {
    (name, Some(file_name), bytes)
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    parts: &[Part<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => {
                let disposition = format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                );
                body.extend_from_slice(disposition.as_bytes());
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}
