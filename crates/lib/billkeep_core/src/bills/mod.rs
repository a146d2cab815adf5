//! Retailer bills, warranty claims and scanned bill photos.

pub mod claims;
pub mod scans;

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::ai::AiError;
use crate::assets::AssetError;
use crate::models::user::normalize_email;
use crate::models::{Bill, BillCustomer, BillItem, NewBill, Role};
use crate::store::{BillStore, StoreError, UserStore};

pub use claims::{ClaimDraft, list_warranty_claims, submit_warranty_claim};
pub use scans::{create_scanned_bill, delete_scanned_bill, list_scanned_bills};

#[derive(Debug, Error)]
pub enum BillError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Largest amount the `NUMERIC(14, 2)` money columns hold.
// 99_999_999_999_999 split into 32-bit words (`Decimal::new` is not const).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Longest warranty a line item may carry (100 years).
pub const MAX_WARRANTY_MONTHS: u32 = 1200;

/// Line item as submitted. Totals and expiry are computed, never accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDraft {
    pub name: String,
    pub company: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(alias = "warranty")]
    pub warranty_months: u32,
}

/// Bill as submitted by a retailer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillDraft {
    pub bill_number: String,
    /// `YYYY-MM-DD`, RFC 3339, or `DD/MM/YYYY`. Today when absent.
    pub bill_date: Option<String>,
    /// Falls back to the retailer's shop name.
    pub shop_name: String,
    pub customer: BillCustomer,
    pub items: Vec<ItemDraft>,
    /// When present it must match the sum of the line totals.
    pub grand_total: Option<Decimal>,
}

/// Parse the date formats bills arrive in.
pub fn parse_bill_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%d-%m-%Y").ok())
}

/// `bill_date` plus `months` calendar months, clamped to the end of the
/// target month. No warranty means no expiry.
pub fn warranty_expiry(bill_date: NaiveDate, months: u32) -> Option<NaiveDate> {
    if months == 0 {
        return None;
    }
    bill_date.checked_add_months(Months::new(months))
}

/// Validate a draft into a storable bill for `owner_id`.
pub fn prepare_bill(
    owner_id: Uuid,
    default_shop_name: &str,
    draft: BillDraft,
    today: NaiveDate,
) -> Result<NewBill, BillError> {
    let mut problems = Vec::new();

    let bill_number = draft.bill_number.trim().to_string();
    if bill_number.is_empty() {
        problems.push("Bill number is required".to_string());
    }

    let shop_name = match draft.shop_name.trim() {
        "" => default_shop_name.trim().to_string(),
        s => s.to_string(),
    };
    if shop_name.is_empty() {
        problems.push("Shop name is required".to_string());
    }

    let bill_date = match draft.bill_date.as_deref().map(str::trim) {
        None | Some("") => Some(today),
        Some(raw) => parse_bill_date(raw),
    };
    if bill_date.is_none() {
        problems.push("Bill date is not a valid date".to_string());
    }

    if draft.items.is_empty() {
        problems.push("At least one item is required".to_string());
    }
    for (i, item) in draft.items.iter().enumerate() {
        let n = i + 1;
        if item.name.trim().is_empty() {
            problems.push(format!("Item {n}: name is required"));
        }
        if item.quantity == 0 {
            problems.push(format!("Item {n}: quantity must be at least 1"));
        }
        if item.price.is_sign_negative() {
            problems.push(format!("Item {n}: price cannot be negative"));
        }
        if item.warranty_months > MAX_WARRANTY_MONTHS {
            problems.push(format!("Item {n}: warranty cannot exceed {MAX_WARRANTY_MONTHS} months"));
        }
    }

    let (Some(bill_date), true) = (bill_date, problems.is_empty()) else {
        return Err(BillError::Validation(problems.join(", ")));
    };

    let mut items = Vec::with_capacity(draft.items.len());
    let mut computed = Some(Decimal::ZERO);
    for (i, item) in draft.items.into_iter().enumerate() {
        let n = i + 1;
        let total = item
            .price
            .checked_mul(Decimal::from(item.quantity))
            .filter(|t| t.round_dp(2) <= MAX_AMOUNT);
        let Some(total) = total else {
            problems.push(format!("Item {n}: amount is too large"));
            continue;
        };
        let expiry = warranty_expiry(bill_date, item.warranty_months);
        if item.warranty_months > 0 && expiry.is_none() {
            problems.push(format!("Item {n}: warranty expiry is out of range"));
            continue;
        }
        computed = computed.and_then(|sum| sum.checked_add(total));
        items.push(BillItem {
            name: item.name.trim().to_string(),
            company: item.company.trim().to_string(),
            quantity: item.quantity,
            total,
            price: item.price,
            warranty_months: item.warranty_months,
            warranty_expiry: expiry,
        });
    }
    if !problems.is_empty() {
        return Err(BillError::Validation(problems.join(", ")));
    }
    let Some(computed) = computed.filter(|sum| sum.round_dp(2) <= MAX_AMOUNT) else {
        return Err(BillError::Validation("Grand total is too large".into()));
    };

    if let Some(claimed) = draft.grand_total
        && claimed.round_dp(2) != computed.round_dp(2)
    {
        return Err(BillError::Validation(format!(
            "Grand total {claimed} does not match the item total {}",
            computed.round_dp(2)
        )));
    }

    let mut customer = draft.customer;
    customer.name = customer.name.trim().to_string();
    customer.phone = customer.phone.trim().to_string();
    customer.email = normalize_email(&customer.email);

    Ok(NewBill {
        owner_id,
        bill_number,
        bill_date,
        shop_name,
        customer,
        items,
        grand_total: computed.round_dp(2),
    })
}

/// Create a bill for a retailer.
pub async fn create_bill<S>(store: &S, owner_id: Uuid, draft: BillDraft) -> Result<Bill, BillError>
where
    S: UserStore + BillStore + ?Sized,
{
    let owner = store
        .find_user_by_id(owner_id)
        .await?
        .ok_or_else(|| BillError::NotFound("User not found".into()))?;
    if owner.role != Role::Retailer {
        return Err(BillError::Forbidden("Only retailers can create bills".into()));
    }

    let new_bill = prepare_bill(owner.id, &owner.shop_name, draft, Utc::now().date_naive())?;
    let bill = store.insert_bill(new_bill).await.map_err(|e| match e {
        StoreError::Conflict(_) => BillError::Conflict("Bill number already exists".into()),
        other => BillError::Store(other),
    })?;

    info!(
        bill_id = %bill.id,
        bill_number = %bill.bill_number,
        items = bill.items.len(),
        "created bill"
    );
    Ok(bill)
}

/// Bills the retailer created, newest first.
pub async fn list_bills_for_retailer<S>(store: &S, owner_id: Uuid) -> Result<Vec<Bill>, BillError>
where
    S: BillStore + ?Sized,
{
    Ok(store.bills_for_owner(owner_id).await?)
}

/// Bills issued to `email` as the customer, newest first.
pub async fn list_bills_for_customer<S>(store: &S, email: &str) -> Result<Vec<Bill>, BillError>
where
    S: BillStore + ?Sized,
{
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(BillError::Validation("Email is required".into()));
    }
    Ok(store.bills_for_customer_email(&email).await?)
}
