//! API Routes Module
//!
//! JSON endpoints for characters, audio and avatars.

pub mod audio;
pub mod avatars;
pub mod characters;
pub mod error;
pub mod form;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::static_files;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "talking-avatar-gateway",
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full application router, static mounts included.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/characters/generate", post(characters::generate_character))
        .route("/api/characters/edit", post(characters::edit_character))
        .route("/api/characters/upload", post(characters::upload_character))
        .route("/api/characters/list", get(characters::list_characters))
        .route("/api/audio/generate", post(audio::generate_audio))
        .route("/api/audio/preview", post(audio::preview_voice))
        .route("/api/audio/list", get(audio::list_audio))
        .route("/api/avatar/create", post(avatars::create_avatar))
        .route("/api/avatars/list", get(avatars::list_avatars))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    let router = static_files::mount(api, &state.config.storage_dir, &state.config.frontend_dist);

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
