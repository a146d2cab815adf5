//! Warranty claim domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim workflow status. New claims start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
    Resolved,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::UnderReview => "Under Review",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ClaimStatus::Pending),
            "Under Review" => Ok(ClaimStatus::UnderReview),
            "Approved" => Ok(ClaimStatus::Approved),
            "Rejected" => Ok(ClaimStatus::Rejected),
            "Resolved" => Ok(ClaimStatus::Resolved),
            other => Err(format!("unknown claim status: {other}")),
        }
    }
}

/// Stored warranty claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyClaim {
    pub id: Uuid,
    pub customer_email: String,
    pub customer_name: String,
    pub bill_id: Option<Uuid>,
    pub item_name: String,
    pub company_name: String,
    pub item_cost: Option<Decimal>,
    pub issue_description: String,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Validated claim ready to be written.
#[derive(Debug, Clone)]
pub struct NewWarrantyClaim {
    pub customer_email: String,
    pub customer_name: String,
    pub bill_id: Option<Uuid>,
    pub item_name: String,
    pub company_name: String,
    pub item_cost: Option<Decimal>,
    pub issue_description: String,
}
