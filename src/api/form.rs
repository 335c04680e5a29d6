//! Form input accepted as either urlencoded or multipart bodies.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use std::collections::HashMap;

use super::error::ApiError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct FormInput {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormInput {
    /// Empty values count as missing.
    pub fn required(&self, name: &str) -> Result<String, ApiError> {
        self.fields
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| ApiError::unprocessable(format!("Field required: {name}")))
    }

    pub fn optional_or(&self, name: &str, default: &str) -> String {
        self.fields
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn file(&mut self, name: &str) -> Result<UploadedFile, ApiError> {
        self.files
            .remove(name)
            .ok_or_else(|| ApiError::unprocessable(format!("Field required: {name}")))
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError {
                    status: e.status(),
                    message: e.body_text(),
                })?;
            return Ok(Self {
                fields,
                files: HashMap::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError {
                status: e.status(),
                message: e.body_text(),
            })?;

        let mut input = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
            status: e.status(),
            message: e.body_text(),
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await.map_err(|e| ApiError {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                input.files.insert(
                    name,
                    UploadedFile {
                        file_name: Some(file_name),
                        bytes,
                    },
                );
            } else {
                let text = field.text().await.map_err(|e| ApiError {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                input.fields.insert(name, text);
            }
        }

        Ok(input)
    }
}
