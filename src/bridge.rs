//! Upload Bridge
//!
//! Remote operations only accept URLs the provider can fetch. Public paths of
//! local artifacts are uploaded first; anything else passes through as-is.

use std::sync::Arc;
use tracing::info;

use crate::error::AppResult;
use crate::generator::InferenceProvider;
use crate::storage::ArtifactStore;

#[derive(Clone)]
pub struct UploadBridge {
    store: ArtifactStore,
    provider: Arc<dyn InferenceProvider>,
}

impl UploadBridge {
    pub fn new(store: ArtifactStore, provider: Arc<dyn InferenceProvider>) -> Self {
        Self { store, provider }
    }

    /// Returns a provider-reachable URL for `reference`. Local artifacts are
    /// re-uploaded on every call.
    pub async fn resolve(&self, reference: &str) -> AppResult<String> {
        match self.store.local_path(reference)? {
            Some(local) => {
                info!(reference = %reference, local = %local.display(), "Uploading local artifact");
                self.provider.upload_file(&local).await
            }
            None => Ok(reference.to_string()),
        }
    }
}
