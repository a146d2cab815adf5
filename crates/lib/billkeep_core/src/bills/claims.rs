//! Warranty claims, submitted by customers against items they bought.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{BillError, MAX_AMOUNT};
use crate::models::user::normalize_email;
use crate::models::{NewWarrantyClaim, WarrantyClaim};
use crate::store::{ClaimStore, StoreError};

/// Shortest accepted issue description, after trimming.
pub const MIN_ISSUE_DESCRIPTION_LEN: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimDraft {
    pub customer_email: String,
    pub customer_name: String,
    pub bill_id: Option<Uuid>,
    pub item_name: String,
    pub company_name: String,
    pub item_cost: Option<Decimal>,
    pub issue_description: String,
}

/// File a new claim. Claims always start `Pending`.
pub async fn submit_warranty_claim<S>(
    store: &S,
    draft: ClaimDraft,
) -> Result<WarrantyClaim, BillError>
where
    S: ClaimStore + ?Sized,
{
    let customer_email = normalize_email(&draft.customer_email);
    let item_name = draft.item_name.trim().to_string();
    let company_name = draft.company_name.trim().to_string();
    let issue_description = draft.issue_description.trim().to_string();

    let mut problems = Vec::new();
    if customer_email.is_empty() {
        problems.push("Customer email is required".to_string());
    }
    if item_name.is_empty() {
        problems.push("Item name is required".to_string());
    }
    if company_name.is_empty() {
        problems.push("Company name is required".to_string());
    }
    if issue_description.is_empty() {
        problems.push("Issue description is required".to_string());
    } else if issue_description.chars().count() < MIN_ISSUE_DESCRIPTION_LEN {
        problems.push(format!(
            "Issue description must be at least {MIN_ISSUE_DESCRIPTION_LEN} characters"
        ));
    }
    if draft.item_cost.is_some_and(|c| c.is_sign_negative()) {
        problems.push("Item cost cannot be negative".to_string());
    }
    if draft.item_cost.is_some_and(|c| c.round_dp(2) > MAX_AMOUNT) {
        problems.push("Item cost is too large".to_string());
    }
    if !problems.is_empty() {
        return Err(BillError::Validation(problems.join(", ")));
    }

    let claim = store
        .insert_claim(NewWarrantyClaim {
            customer_email,
            customer_name: draft.customer_name.trim().to_string(),
            bill_id: draft.bill_id,
            item_name,
            company_name,
            item_cost: draft.item_cost,
            issue_description,
        })
        .await
        .map_err(|e| match e {
            StoreError::MissingReference(_) => BillError::NotFound("Bill not found".into()),
            other => BillError::Store(other),
        })?;

    info!(claim_id = %claim.id, item = %claim.item_name, "warranty claim submitted");
    Ok(claim)
}

/// Claims filed under `email`, newest first.
pub async fn list_warranty_claims<S>(
    store: &S,
    email: Option<&str>,
) -> Result<Vec<WarrantyClaim>, BillError>
where
    S: ClaimStore + ?Sized,
{
    let email = email.map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        return Err(BillError::Validation("Email is required".into()));
    }
    Ok(store.claims_for_email(&email).await?)
}
