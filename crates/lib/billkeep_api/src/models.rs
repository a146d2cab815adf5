//! Response envelopes.

use billkeep_core::models::{Bill, PublicUser, Role, ScannedBill, WarrantyClaim};
use serde::Serialize;

/// Success envelope. Only the fields a handler sets are serialized.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill: Option<Bill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bills: Option<Vec<Bill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<WarrantyClaim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<WarrantyClaim>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_bill: Option<ScannedBill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_bills: Option<Vec<ScannedBill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }
}

/// Error envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    /// Stored role, on role mismatch only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_role: Option<Role>,
}
