//! Scanned bill photos kept by their owner, optionally with AI-read fields.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::BillError;
use crate::ai::{self, GenerativeModel};
use crate::assets::{self, AssetStore, AssetUpload, SCANNED_BILL_FOLDER};
use crate::models::{NewScannedBill, ScannedBill};
use crate::store::ScanStore;

/// Upload a bill photo and record it. With `extract`, the model reads the
/// bill first; a failed read is logged and the photo is kept without fields.
pub async fn create_scanned_bill<S>(
    store: &S,
    assets: &Arc<dyn AssetStore>,
    model: &dyn GenerativeModel,
    owner_id: Uuid,
    image: AssetUpload,
    note: Option<String>,
    extract: bool,
) -> Result<ScannedBill, BillError>
where
    S: ScanStore + ?Sized,
{
    image.ensure_supported_image()?;

    let extracted = if extract {
        match ai::extract_bill(model, &image).await {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!(error = %e, %owner_id, "bill extraction failed, storing photo only");
                None
            }
        }
    } else {
        None
    };

    let stored = assets.upload(&image, SCANNED_BILL_FOLDER).await?;
    let public_id = stored.public_id.clone();

    let scan = store
        .insert_scan(NewScannedBill {
            owner_id,
            photo_url: stored.url,
            photo_public_id: stored.public_id,
            extracted,
            note: note.map(|n| n.trim().to_string()).unwrap_or_default(),
        })
        .await;

    match scan {
        Ok(scan) => {
            info!(scan_id = %scan.id, extracted = scan.extracted.is_some(), "stored scanned bill");
            Ok(scan)
        }
        Err(e) => {
            assets::delete_detached(Arc::clone(assets), public_id);
            Err(e.into())
        }
    }
}

pub async fn list_scanned_bills<S>(store: &S, owner_id: Uuid) -> Result<Vec<ScannedBill>, BillError>
where
    S: ScanStore + ?Sized,
{
    Ok(store.scans_for_owner(owner_id).await?)
}

/// Delete one of the owner's scans. Someone else's scan is reported as missing.
pub async fn delete_scanned_bill<S>(
    store: &S,
    assets: &Arc<dyn AssetStore>,
    owner_id: Uuid,
    id: Uuid,
) -> Result<ScannedBill, BillError>
where
    S: ScanStore + ?Sized,
{
    let removed = store
        .delete_scan(owner_id, id)
        .await?
        .ok_or_else(|| BillError::NotFound("Scanned bill not found".into()))?;

    if !removed.photo_public_id.is_empty() {
        assets::delete_detached(Arc::clone(assets), removed.photo_public_id.clone());
    }
    info!(scan_id = %removed.id, "deleted scanned bill");
    Ok(removed)
}
