//! Talking Avatar Gateway
//!
//! Proxies character-image, speech and avatar-video generation to fal.ai and
//! keeps every produced artifact under a local storage directory.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod generator;
pub mod state;
pub mod static_files;
pub mod storage;

pub use api::create_router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;
