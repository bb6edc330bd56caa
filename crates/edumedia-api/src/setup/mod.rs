//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use edumedia_core::Config;
use edumedia_processing::UploadOrchestrator;
use edumedia_storage::{create_storage, RemoteStorage};
use std::sync::Arc;

/// Build storage, services and routes from a validated configuration.
pub async fn initialize_app(config: &Config) -> Result<(Arc<AppState>, axum::Router)> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let state = build_state(config, storage);
    let router = routes::setup_routes(config, state.clone())?;

    Ok((state, router))
}

/// Wire the upload orchestrator and deletion client over `storage`.
pub fn build_state(config: &Config, storage: Arc<dyn RemoteStorage>) -> Arc<AppState> {
    let orchestrator = UploadOrchestrator::new(storage.clone(), config.upload.clone());
    Arc::new(AppState::new(storage, orchestrator))
}
