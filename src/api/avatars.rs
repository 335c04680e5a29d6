//! Talking-avatar synthesis from a character image and a speech clip.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::error::ApiError;
use super::form::FormInput;
use crate::state::AppState;
use crate::storage::{ArtifactDescriptor, Category};

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub url: String,
    pub name: String,
    pub id: String,
    pub character_url: String,
    pub audio_url: String,
}

pub async fn create_avatar(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> Result<Json<AvatarResponse>, ApiError> {
    let character_url = form.required("character_url")?;
    let audio_url = form.required("audio_url")?;
    let name = form.optional_or("name", "My Avatar");

    let mut character_remote: Option<String> = None;
    let mut audio_remote: Option<String> = None;

    let outcome = async {
        let image = state.bridge.resolve(&character_url).await?;
        character_remote = Some(image.clone());
        let audio = state.bridge.resolve(&audio_url).await?;
        audio_remote = Some(audio.clone());

        let video = state.generator.create_avatar(&image, &audio).await?;
        state
            .store
            .download_and_save(&video.url, Category::Avatars, "mp4")
            .await
    }
    .await;

    let stored = match outcome {
        Ok(stored) => stored,
        Err(e) => {
            error!(
                error = %e,
                character_url = %character_url,
                audio_url = %audio_url,
                character_remote_url = ?character_remote,
                audio_remote_url = ?audio_remote,
                "Avatar creation failed"
            );
            return Err(e.into());
        }
    };

    info!(name = %name, url = %stored.public_path, "Avatar created");

    Ok(Json(AvatarResponse {
        url: stored.public_path,
        name,
        id: stored.id,
        character_url,
        audio_url,
    }))
}

pub async fn list_avatars(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArtifactDescriptor>>, ApiError> {
    Ok(Json(state.store.list(Category::Avatars).await?))
}
