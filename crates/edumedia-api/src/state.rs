//! Shared application state.

use std::sync::Arc;

use edumedia_core::StorageBackend;
use edumedia_processing::UploadOrchestrator;
use edumedia_storage::{RemoteStorage, ResourceDeletionClient};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<UploadOrchestrator>,
    pub deletion: ResourceDeletionClient,
    pub backend: StorageBackend,
}

impl AppState {
    /// Build the upload and deletion services on top of one storage backend.
    pub fn new(storage: Arc<dyn RemoteStorage>, orchestrator: UploadOrchestrator) -> Self {
        Self {
            backend: storage.backend_type(),
            deletion: ResourceDeletionClient::new(storage),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
