//! Speech endpoints. Generated clips are stored; voice previews stay remote.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use super::error::ApiError;
use super::form::FormInput;
use crate::state::AppState;
use crate::storage::{ArtifactDescriptor, Category};

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub url: String,
    pub text: String,
    pub voice: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct VoicePreviewResponse {
    pub audio_url: String,
}

pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> Result<Json<AudioResponse>, ApiError> {
    let text = form.required("text")?;
    let voice = form.optional_or("voice", "Rachel");

    let result = async {
        let audio = state.generator.generate_speech(&text, &voice).await?;
        state
            .store
            .download_and_save(&audio.url, Category::Audio, "mp3")
            .await
    }
    .await
    .map_err(|e| {
        error!(error = %e, voice = %voice, "Speech generation failed");
        ApiError::from(e)
    })?;

    Ok(Json(AudioResponse {
        url: result.public_path,
        text,
        voice,
        id: result.id,
    }))
}

pub async fn preview_voice(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> Result<Json<VoicePreviewResponse>, ApiError> {
    let voice = form.required("voice")?;

    let audio = state.generator.preview_voice(&voice).await.map_err(|e| {
        error!(error = %e, voice = %voice, "Voice preview failed");
        ApiError::from(e)
    })?;

    Ok(Json(VoicePreviewResponse {
        audio_url: audio.url,
    }))
}

pub async fn list_audio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArtifactDescriptor>>, ApiError> {
    Ok(Json(state.store.list(Category::Audio).await?))
}
