#[cfg(feature = "storage-cloudinary")]
use crate::CloudinaryStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{RemoteStorage, StorageBackend, StorageError, StorageResult};
use edumedia_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn RemoteStorage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-cloudinary")]
        StorageBackend::Cloudinary => {
            let credentials = config.cloudinary.clone().ok_or_else(|| {
                StorageError::ConfigError("Cloudinary credentials not configured".to_string())
            })?;

            tracing::info!(
                cloud = %credentials.cloud_name,
                api_base = %credentials.api_base,
                "Using Cloudinary storage backend"
            );
            let storage = CloudinaryStorage::new(credentials)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-cloudinary"))]
        StorageBackend::Cloudinary => Err(StorageError::ConfigError(
            "Cloudinary storage backend not available (storage-cloudinary feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let local = config.local_storage.as_ref().ok_or_else(|| {
                StorageError::ConfigError(
                    "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL not configured".to_string(),
                )
            })?;

            tracing::info!(path = %local.path, "Using local storage backend");
            let storage = LocalStorage::new(&local.path, local.base_url.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
