//! Scanned bill photos and the fields extracted from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields the generative model read off a bill photo. Everything is optional;
/// the model only reports what it could see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedBill {
    pub shop_name: Option<String>,
    pub bill_number: Option<String>,
    pub bill_date: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<ExtractedItem>,
    pub grand_total: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedItem {
    pub name: Option<String>,
    pub company: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub total: Option<Decimal>,
    pub warranty_months: Option<Decimal>,
}

/// Stored scanned bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedBill {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub photo_url: String,
    #[serde(skip_serializing, default)]
    pub photo_public_id: String,
    pub extracted: Option<ExtractedBill>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScannedBill {
    pub owner_id: Uuid,
    pub photo_url: String,
    pub photo_public_id: String,
    pub extracted: Option<ExtractedBill>,
    pub note: String,
}
