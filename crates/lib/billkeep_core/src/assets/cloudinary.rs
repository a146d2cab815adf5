//! Cloudinary upload and destroy API client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{AssetError, AssetStore, AssetUpload, StoredAsset};

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Account credentials. All three must be set for the store to work.
#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl CloudinaryConfig {
    /// Read `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            cloud_name: var("CLOUDINARY_CLOUD_NAME"),
            api_key: var("CLOUDINARY_API_KEY"),
            api_secret: var("CLOUDINARY_API_SECRET"),
        }
    }

    fn credentials(&self) -> Result<(&str, &str, &str), AssetError> {
        match (
            self.cloud_name.as_deref(),
            self.api_key.as_deref(),
            self.api_secret.as_deref(),
        ) {
            (Some(cloud), Some(key), Some(secret)) => Ok((cloud, key, secret)),
            _ => Err(AssetError::Configuration(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET are required"
                    .into(),
            )),
        }
    }
}

/// Sign request parameters: sorted `k=v` pairs joined by `&`, secret appended,
/// SHA-256, lower-case hex.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct CloudinaryAssetStore {
    client: Client,
    config: CloudinaryConfig,
    api_base: String,
}

impl CloudinaryAssetStore {
    pub fn new(client: Client, config: CloudinaryConfig) -> Self {
        Self {
            client,
            config,
            api_base: CLOUDINARY_API_BASE.to_string(),
        }
    }

    fn endpoint(&self, cloud: &str, action: &str) -> String {
        format!("{}/{cloud}/image/{action}", self.api_base)
    }
}

#[async_trait]
impl AssetStore for CloudinaryAssetStore {
    async fn upload(&self, file: &AssetUpload, folder: &str) -> Result<StoredAsset, AssetError> {
        let (cloud, key, secret) = self.config.credentials()?;
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(&[("folder", folder), ("timestamp", &timestamp)], secret);

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime())
            .map_err(|e| AssetError::Upstream(format!("invalid mime type: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", key.to_string())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let resp = self
            .client
            .post(self.endpoint(cloud, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssetError::Upstream(format!("upload request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Cloudinary upload failed");
            return Err(AssetError::Upstream(format!("upload HTTP {status}")));
        }

        let uploaded = resp
            .json::<UploadResponse>()
            .await
            .map_err(|e| AssetError::Upstream(format!("upload parse error: {e}")))?;
        debug!(public_id = %uploaded.public_id, folder, "uploaded asset");

        Ok(StoredAsset {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), AssetError> {
        let (cloud, key, secret) = self.config.credentials()?;
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            secret,
        );

        let resp = self
            .client
            .post(self.endpoint(cloud, "destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", key),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| AssetError::Upstream(format!("destroy request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Upstream(format!("destroy HTTP {status}")));
        }
        let outcome = resp
            .json::<DestroyResponse>()
            .await
            .map_err(|e| AssetError::Upstream(format!("destroy parse error: {e}")))?;

        // "not found" means someone already removed it.
        match outcome.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AssetError::Upstream(format!("destroy returned {other}"))),
        }
    }
}
