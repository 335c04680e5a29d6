//! fal.ai client
//!
//! Jobs go through the synchronous `fal.run` endpoint, which holds the request
//! open until the result is ready. Local files reach provider storage through
//! the two-step initiate/PUT upload.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

use super::InferenceProvider;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

pub struct FalClient {
    http_client: Client,
    api_key: String,
    run_url: String,
    rest_url: String,
}

#[derive(Debug, Serialize)]
struct InitiateUploadRequest<'a> {
    content_type: &'a str,
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitiateUploadResponse {
    upload_url: String,
    file_url: String,
}

impl FalClient {
    pub fn new(
        http_client: Client,
        api_key: impl Into<String>,
        run_url: impl Into<String>,
        rest_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            run_url: run_url.into(),
            rest_url: rest_url.into(),
        }
    }

    pub fn from_config(http_client: Client, config: &AppConfig) -> Self {
        Self::new(
            http_client,
            config.fal_key.clone(),
            config.fal_run_url.clone(),
            config.fal_rest_url.clone(),
        )
    }

    fn auth_header(&self) -> String {
        format!("Key {}", self.api_key)
    }

    async fn check_status(url: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(url = %url, status = status, "Provider returned error status");
        Err(AppError::Status {
            url: url.to_string(),
            status,
            body,
        })
    }
}

#[async_trait]
impl InferenceProvider for FalClient {
    async fn subscribe(&self, slug: &str, arguments: Value) -> AppResult<Value> {
        let endpoint = format!("{}/{}", self.run_url, slug.trim_start_matches('/'));

        let response = self
            .http_client
            .post(&endpoint)
            .header(AUTHORIZATION, self.auth_header())
            .json(&arguments)
            .send()
            .await
            .map_err(|e| AppError::http(&endpoint, e))?;
        let response = Self::check_status(&endpoint, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::http(&endpoint, e))?;
        serde_json::from_str(&body).map_err(|e| AppError::malformed(slug, e.to_string()))
    }

    async fn upload_file(&self, path: &Path) -> AppResult<String> {
        let bytes = fs::read(path).await.map_err(|e| AppError::io(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin");
        let content_type = content_type_for(path);

        let initiate_url = format!(
            "{}/storage/upload/initiate?storage_type=fal-cdn-v3",
            self.rest_url
        );
        let response = self
            .http_client
            .post(&initiate_url)
            .header(AUTHORIZATION, self.auth_header())
            .json(&InitiateUploadRequest {
                content_type,
                file_name,
            })
            .send()
            .await
            .map_err(|e| AppError::http(&initiate_url, e))?;
        let response = Self::check_status(&initiate_url, response).await?;
        let target: InitiateUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::malformed("storage/upload/initiate", e.to_string()))?;

        let size = bytes.len();
        let response = self
            .http_client
            .put(&target.upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::http(&target.upload_url, e))?;
        Self::check_status(&target.upload_url, response).await?;

        info!(
            path = %path.display(),
            bytes = size,
            file_url = %target.file_url,
            "Uploaded local file to provider storage"
        );
        Ok(target.file_url)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> FalClient {
        let http = Client::builder().no_proxy().build().unwrap();
        FalClient::new(http, "id:secret", server.uri(), server.uri())
    }

    #[tokio::test]
    async fn subscribe_posts_arguments_to_slug() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fal-ai/imagen4/preview"))
            .and(header("authorization", "Key id:secret"))
            .and(body_json(json!({ "prompt": "a wizard" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "images": [{ "url": "https://cdn/w.png" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let value = client(&server)
            .subscribe("fal-ai/imagen4/preview", json!({ "prompt": "a wizard" }))
            .await
            .unwrap();
        assert_eq!(value["images"][0]["url"], "https://cdn/w.png");
    }

    #[tokio::test]
    async fn subscribe_surfaces_error_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("voice not found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .subscribe("fal-ai/elevenlabs/tts/turbo-v2.5", json!({}))
            .await
            .unwrap_err();
        match &err {
            AppError::Status { status, body, .. } => {
                assert_eq!(*status, 422);
                assert_eq!(body, "voice not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("voice not found"));
    }

    #[tokio::test]
    async fn subscribe_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .subscribe("fal-ai/bytedance/omnihuman", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn upload_initiates_then_puts_bytes() {
        let server = MockServer::start().await;
        let upload_target = format!("{}/upload-target/abc", server.uri());

        Mock::given(method("POST"))
            .and(path("/storage/upload/initiate"))
            .and(query_param("storage_type", "fal-cdn-v3"))
            .and(header("authorization", "Key id:secret"))
            .and(body_json(json!({ "content_type": "audio/mpeg", "file_name": "clip.mp3" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "upload_url": upload_target,
                "file_url": "https://v3.fal.media/files/clip.mp3"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload-target/abc"))
            .and(header("content-type", "audio/mpeg"))
            .and(body_bytes(b"ID3-bytes".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("clip.mp3");
        std::fs::write(&file, b"ID3-bytes").unwrap();

        let url = client(&server).upload_file(&file).await.unwrap();
        assert_eq!(url, "https://v3.fal.media/files/clip.mp3");
    }

    #[tokio::test]
    async fn upload_of_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let err = client(&server)
            .upload_file(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }
}
