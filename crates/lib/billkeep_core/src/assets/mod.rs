//! Image assets: validation of uploads and the remote store they live in.

pub mod cloudinary;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use cloudinary::{CloudinaryAssetStore, CloudinaryConfig};

/// Image extensions accepted for profile pictures and bill photos.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Folder for profile pictures.
pub const PROFILE_PICTURE_FOLDER: &str = "profile-pictures";

/// Folder for scanned bill photos.
pub const SCANNED_BILL_FOLDER: &str = "scanned-bills";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Unsupported file type: {0}. Allowed types: jpg, jpeg, png, webp")]
    UnsupportedType(String),

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Asset store is not configured: {0}")]
    Configuration(String),

    #[error("Asset store error: {0}")]
    Upstream(String),
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Lower-cased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() && ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Reject anything that is not a non-empty jpg, jpeg, png or webp.
    pub fn ensure_supported_image(&self) -> Result<(), AssetError> {
        match self.extension() {
            Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => {}
            Some(ext) => return Err(AssetError::UnsupportedType(format!(".{ext}"))),
            None => return Err(AssetError::UnsupportedType(self.file_name.clone())),
        }
        if self.bytes.is_empty() {
            return Err(AssetError::Empty);
        }
        Ok(())
    }

    /// MIME type to forward upstream. Falls back to the extension when the
    /// client sent none or a generic one.
    pub fn mime(&self) -> String {
        if let Some(ct) = self
            .content_type
            .as_deref()
            .filter(|ct| ct.starts_with("image/"))
        {
            return ct.to_string();
        }
        match self.extension().as_deref() {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
        .to_string()
    }
}

/// Where an uploaded asset ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub url: String,
    pub public_id: String,
}

/// Remote image storage.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, file: &AssetUpload, folder: &str) -> Result<StoredAsset, AssetError>;

    async fn delete(&self, public_id: &str) -> Result<(), AssetError>;
}

/// Delete an asset in the background. Failure is logged and otherwise ignored.
pub fn delete_detached(assets: Arc<dyn AssetStore>, public_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match assets.delete(&public_id).await {
            Ok(()) => debug!(%public_id, "deleted asset"),
            Err(e) => warn!(%public_id, error = %e, "asset deletion failed"),
        }
    })
}
