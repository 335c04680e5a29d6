//! Remote Media Generator
//!
//! Typed wrappers over the inference provider. Each operation posts one
//! argument object to a fixed slug, waits for the job, and reduces the
//! response to a single hosted-file URL.

pub mod fal;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};

pub use fal::FalClient;

pub const IMAGE_GENERATION_SLUG: &str = "fal-ai/imagen4/preview";
pub const IMAGE_EDIT_SLUG: &str = "fal-ai/flux-pro/kontext";
pub const TTS_SLUG: &str = "fal-ai/elevenlabs/tts/turbo-v2.5";
pub const AVATAR_SLUG: &str = "fal-ai/bytedance/omnihuman";

/// The remote inference service.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Runs `slug` with `arguments` and blocks until the job has a result.
    async fn subscribe(&self, slug: &str, arguments: Value) -> AppResult<Value>;

    /// Pushes a local file to provider storage and returns its hosted URL.
    async fn upload_file(&self, path: &Path) -> AppResult<String>;
}

#[derive(Debug, Clone, Deserialize)]
struct HostedFile {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ImagesPayload {
    images: Vec<HostedFile>,
}

#[derive(Debug, Deserialize)]
struct AudioPayload {
    audio: HostedFile,
}

#[derive(Debug, Deserialize)]
struct VideoPayload {
    video: HostedFile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioResult {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoResult {
    pub url: String,
}

impl ImageResult {
    fn from_response(slug: &str, response: Value) -> AppResult<Self> {
        let payload: ImagesPayload = parse(slug, response)?;
        let first = payload
            .images
            .into_iter()
            .next()
            .ok_or_else(|| AppError::malformed(slug, "response contained no images"))?;
        Ok(Self { url: first.url })
    }
}

impl AudioResult {
    fn from_response(slug: &str, response: Value) -> AppResult<Self> {
        let payload: AudioPayload = parse(slug, response)?;
        Ok(Self {
            url: payload.audio.url,
        })
    }
}

impl VideoResult {
    fn from_response(slug: &str, response: Value) -> AppResult<Self> {
        let payload: VideoPayload = parse(slug, response)?;
        Ok(Self {
            url: payload.video.url,
        })
    }
}

fn parse<T: DeserializeOwned>(slug: &str, response: Value) -> AppResult<T> {
    serde_json::from_value(response).map_err(|e| AppError::malformed(slug, e.to_string()))
}

pub fn preview_text(voice: &str) -> String {
    format!("Hi! I'm {voice}. This is what my voice sounds like.")
}

#[derive(Clone)]
pub struct MediaGenerator {
    provider: Arc<dyn InferenceProvider>,
}

impl MediaGenerator {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate_character(&self, prompt: &str) -> AppResult<ImageResult> {
        let slug = IMAGE_GENERATION_SLUG;
        let response = self.run(slug, json!({ "prompt": prompt })).await?;
        ImageResult::from_response(slug, response)
    }

    pub async fn edit_character(&self, image_url: &str, prompt: &str) -> AppResult<ImageResult> {
        let slug = IMAGE_EDIT_SLUG;
        let response = self
            .run(slug, json!({ "image_url": image_url, "prompt": prompt }))
            .await?;
        ImageResult::from_response(slug, response)
    }

    pub async fn generate_speech(&self, text: &str, voice: &str) -> AppResult<AudioResult> {
        let slug = TTS_SLUG;
        let response = self.run(slug, json!({ "text": text, "voice": voice })).await?;
        AudioResult::from_response(slug, response)
    }

    pub async fn preview_voice(&self, voice: &str) -> AppResult<AudioResult> {
        self.generate_speech(&preview_text(voice), voice).await
    }

    pub async fn create_avatar(&self, image_url: &str, audio_url: &str) -> AppResult<VideoResult> {
        let slug = AVATAR_SLUG;
        let response = self
            .run(slug, json!({ "image_url": image_url, "audio_url": audio_url }))
            .await?;
        VideoResult::from_response(slug, response)
    }

    async fn run(&self, slug: &str, arguments: Value) -> AppResult<Value> {
        info!(slug = %slug, "Submitting inference job");
        let response = self.provider.subscribe(slug, arguments).await?;
        info!(slug = %slug, "Inference job completed");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedProvider {
        response: Value,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl CannedProvider {
        fn new(response: Value) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceProvider for CannedProvider {
        async fn subscribe(&self, slug: &str, arguments: Value) -> AppResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((slug.to_string(), arguments));
            Ok(self.response.clone())
        }

        async fn upload_file(&self, _path: &Path) -> AppResult<String> {
            unreachable!("generator never uploads")
        }
    }

    #[tokio::test]
    async fn generate_character_takes_first_image() {
        let provider = CannedProvider::new(json!({
            "images": [{ "url": "https://cdn/a.png" }, { "url": "https://cdn/b.png" }],
            "seed": 42
        }));
        let generator = MediaGenerator::new(provider.clone());

        let result = generator.generate_character("a knight").await.unwrap();
        assert_eq!(result.url, "https://cdn/a.png");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].0, IMAGE_GENERATION_SLUG);
        assert_eq!(calls[0].1, json!({ "prompt": "a knight" }));
    }

    #[tokio::test]
    async fn edit_sends_image_and_prompt() {
        let provider = CannedProvider::new(json!({ "images": [{ "url": "https://cdn/e.png" }] }));
        let generator = MediaGenerator::new(provider.clone());

        generator
            .edit_character("https://cdn/src.png", "add a hat")
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].0, IMAGE_EDIT_SLUG);
        assert_eq!(
            calls[0].1,
            json!({ "image_url": "https://cdn/src.png", "prompt": "add a hat" })
        );
    }

    #[tokio::test]
    async fn preview_uses_filler_sentence() {
        let provider = CannedProvider::new(json!({ "audio": { "url": "https://cdn/p.mp3" } }));
        let generator = MediaGenerator::new(provider.clone());

        let result = generator.preview_voice("Aria").await.unwrap();
        assert_eq!(result.url, "https://cdn/p.mp3");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].0, TTS_SLUG);
        assert_eq!(
            calls[0].1["text"],
            "Hi! I'm Aria. This is what my voice sounds like."
        );
        assert_eq!(calls[0].1["voice"], "Aria");
    }

    #[tokio::test]
    async fn avatar_reads_video_url() {
        let provider = CannedProvider::new(json!({ "video": { "url": "https://cdn/v.mp4" } }));
        let generator = MediaGenerator::new(provider.clone());

        let result = generator
            .create_avatar("https://cdn/i.png", "https://cdn/a.mp3")
            .await
            .unwrap();
        assert_eq!(result.url, "https://cdn/v.mp4");
        assert_eq!(provider.calls.lock().unwrap()[0].0, AVATAR_SLUG);
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let provider = CannedProvider::new(json!({ "images": [] }));
        let err = MediaGenerator::new(provider)
            .generate_character("x")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));

        let provider = CannedProvider::new(json!({ "audio_url": "https://cdn/a.mp3" }));
        let err = MediaGenerator::new(provider)
            .generate_speech("hello", "Rachel")
            .await
            .unwrap_err();
        match err {
            AppError::MalformedResponse { slug, .. } => assert_eq!(slug, TTS_SLUG),
            other => panic!("unexpected error: {other}"),
        }
    }
}
