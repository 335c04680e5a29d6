use std::sync::Arc;

use crate::bridge::UploadBridge;
use crate::config::AppConfig;
use crate::generator::{InferenceProvider, MediaGenerator};
use crate::storage::ArtifactStore;

// --- Shared State ---
pub struct AppState {
    pub config: AppConfig,
    pub store: ArtifactStore,
    pub generator: MediaGenerator,
    pub bridge: UploadBridge,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn InferenceProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        let store = ArtifactStore::new(config.storage_dir.clone(), http_client);
        let bridge = UploadBridge::new(store.clone(), Arc::clone(&provider));
        let generator = MediaGenerator::new(provider);
        Self {
            config,
            store,
            generator,
            bridge,
        }
    }
}
