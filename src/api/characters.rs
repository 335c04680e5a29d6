//! Character image endpoints: generate, edit, upload, list.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::error::ApiError;
use super::form::FormInput;
use crate::state::AppState;
use crate::storage::{upload_extension, ArtifactDescriptor, Category};

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub url: String,
    pub prompt: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedCharacterResponse {
    pub url: String,
    pub name: String,
    pub id: String,
}

pub async fn generate_character(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> Result<Json<CharacterResponse>, ApiError> {
    let prompt = form.required("prompt")?;
    let model = form.optional_or("model", "imagen4");
    info!(model = %model, "Generating character");

    let result = async {
        let image = state.generator.generate_character(&prompt).await?;
        state
            .store
            .download_and_save(&image.url, Category::Characters, "png")
            .await
    }
    .await
    .map_err(|e| {
        error!(error = %e, "Character generation failed");
        ApiError::from(e)
    })?;

    Ok(Json(CharacterResponse {
        url: result.public_path,
        prompt,
        id: result.id,
    }))
}

pub async fn edit_character(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> Result<Json<CharacterResponse>, ApiError> {
    let image_url = form.required("image_url")?;
    let prompt = form.required("prompt")?;

    let result = async {
        let source_url = state.bridge.resolve(&image_url).await?;
        let image = state.generator.edit_character(&source_url, &prompt).await?;
        state
            .store
            .download_and_save(&image.url, Category::Characters, "png")
            .await
    }
    .await
    .map_err(|e| {
        error!(error = %e, image_url = %image_url, "Character edit failed");
        ApiError::from(e)
    })?;

    Ok(Json(CharacterResponse {
        url: result.public_path,
        prompt,
        id: result.id,
    }))
}

pub async fn upload_character(
    State(state): State<Arc<AppState>>,
    mut form: FormInput,
) -> Result<Json<UploadedCharacterResponse>, ApiError> {
    let file = form.file("file")?;
    let name = form.optional_or("name", "Uploaded Character");
    let extension = upload_extension(file.file_name.as_deref());

    let stored = state
        .store
        .save(&file.bytes, Category::Characters, &extension)
        .await
        .map_err(|e| {
            error!(error = %e, "Character upload failed");
            ApiError::from(e)
        })?;

    Ok(Json(UploadedCharacterResponse {
        url: stored.public_path,
        name,
        id: stored.id,
    }))
}

pub async fn list_characters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArtifactDescriptor>>, ApiError> {
    Ok(Json(state.store.list(Category::Characters).await?))
}
