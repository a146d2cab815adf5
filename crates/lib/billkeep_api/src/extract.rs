//! Request extractors whose rejections use the error envelope.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use billkeep_core::assets::AssetUpload;

use crate::error::AppError;

/// `Json<T>` with [`AppError`] as its rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Text fields plus uploaded files, from either `multipart/form-data` or a
/// flat JSON object. JSON bodies carry no files.
#[derive(Debug, Default)]
pub struct FormInput {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, AssetUpload>,
}

impl FormInput {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Checkbox-style flag: `true`, `1`, `on` or `yes`.
    pub fn flag(&self, name: &str) -> bool {
        self.field(name).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "on" | "yes"
            )
        })
    }

    pub fn take_file(&mut self, name: &str) -> Option<AssetUpload> {
        self.files.remove(name)
    }

    fn from_json(map: HashMap<String, serde_json::Value>) -> Self {
        let fields = map
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Number(n) => Some((k, n.to_string())),
                serde_json::Value::Bool(b) => Some((k, b.to_string())),
                _ => None,
            })
            .collect();
        Self {
            fields,
            files: HashMap::new(),
        }
    }
}

impl<S> FromRequest<S> for FormInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        if is_json {
            let Json(map) =
                Json::<HashMap<String, serde_json::Value>>::from_request(req, state).await?;
            return Ok(Self::from_json(map));
        }

        let mut multipart = Multipart::from_request(req, state).await?;
        let mut input = FormInput::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    input
                        .files
                        .insert(name, AssetUpload::new(file_name, content_type, bytes.to_vec()));
                }
                None => {
                    let text = field.text().await?;
                    input.fields.insert(name, text);
                }
            }
        }
        Ok(input)
    }
}
