//! Bill domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer details captured on a bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillCustomer {
    pub name: String,
    pub phone: String,
    /// Lower-cased at write time so customer lookups can match exactly.
    pub email: String,
}

/// One line of a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub name: String,
    #[serde(default)]
    pub company: String,
    pub quantity: u32,
    /// Unit price.
    pub price: Decimal,
    /// quantity × price.
    pub total: Decimal,
    #[serde(default)]
    pub warranty_months: u32,
    /// `bill_date` advanced by `warranty_months`; absent when there is no warranty.
    #[serde(default)]
    pub warranty_expiry: Option<NaiveDate>,
}

/// Stored bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    pub shop_name: String,
    pub customer: BillCustomer,
    pub items: Vec<BillItem>,
    pub grand_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Validated bill ready to be written.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub owner_id: Uuid,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    pub shop_name: String,
    pub customer: BillCustomer,
    pub items: Vec<BillItem>,
    pub grand_total: Decimal,
}
