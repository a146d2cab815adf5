//! Generative-model features: reading bill photos and summarising sales.
//!
//! The model is a trait; [`GeminiClient`] is the production implementation.

pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::assets::{AssetError, AssetUpload};
use crate::models::ExtractedBill;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Validation error: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    /// `GEMINI_API_KEY` missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model could not be reached or replied with something unusable.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// A text-generating model that optionally accepts one image.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str, image: Option<&AssetUpload>) -> Result<String, AiError>;
}

pub const EXTRACTION_PROMPT: &str = r#"You are reading a photo of a retail bill or invoice.
Extract the fields below and reply with ONLY a JSON object, no commentary and no markdown.
Use null for anything you cannot read. Numbers must be plain numbers without currency symbols.
{
  "shopName": string,
  "billNumber": string,
  "billDate": "YYYY-MM-DD",
  "customerName": string,
  "customerPhone": string,
  "items": [
    {
      "name": string,
      "company": string,
      "quantity": number,
      "price": number,
      "total": number,
      "warrantyMonths": number
    }
  ],
  "grandTotal": number
}"#;

pub const ANALYSIS_PROMPT: &str = "You are a business analyst for a small retail shop. \
Given the sales summary below (JSON), write concise, practical insights: best and worst \
selling products, revenue trends, warranty exposure, and two or three concrete suggestions. \
Use short paragraphs or bullet points. Do not invent figures that are not in the data.";

/// Slice out the outermost JSON object of a model reply (first `{` to last `}`).
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Read bill fields off a photo.
pub async fn extract_bill(
    model: &dyn GenerativeModel,
    image: &AssetUpload,
) -> Result<ExtractedBill, AiError> {
    image.ensure_supported_image()?;

    let reply = model.generate(EXTRACTION_PROMPT, Some(image)).await?;
    let json = extract_json_object(&reply).ok_or_else(|| {
        warn!(reply_len = reply.len(), "model reply contained no JSON object");
        AiError::Upstream("Could not read bill details from the image".into())
    })?;

    let extracted = serde_json::from_str::<ExtractedBill>(json).map_err(|e| {
        warn!(error = %e, "model reply was not a valid bill object");
        AiError::Upstream("Could not read bill details from the image".into())
    })?;
    debug!(items = extracted.items.len(), "extracted bill from image");
    Ok(extracted)
}

/// Ask the model for insights on a caller-supplied sales summary.
pub async fn analyze_sales(
    model: &dyn GenerativeModel,
    summary: &serde_json::Value,
) -> Result<String, AiError> {
    let is_empty = match summary {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(AiError::InvalidInput("Sales summary is required".into()));
    }

    let prompt = format!("{ANALYSIS_PROMPT}\n\nSales summary:\n{summary}");
    let insights = model.generate(&prompt, None).await?;
    if insights.trim().is_empty() {
        return Err(AiError::Upstream("Model returned no insights".into()));
    }
    Ok(insights.trim().to_string())
}
