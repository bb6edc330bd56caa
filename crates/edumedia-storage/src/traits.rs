//! Storage abstraction trait
//!
//! This module defines the RemoteStorage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use edumedia_core::{ResourceKind, StoredObjectDescriptor, UploadOptions, UploadSource};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The service refused the payload because of its size (HTTP 413 or an
    /// equivalent size-limit message). Never retried.
    #[error("File exceeds the storage size limit: {0}")]
    EntityTooLarge(String),

    #[error("Remote service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response from remote service: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upload failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    /// True when this error, or the last cause of an exhausted retry, is a
    /// size-limit rejection.
    pub fn is_entity_too_large(&self) -> bool {
        match self {
            StorageError::EntityTooLarge(_) => true,
            StorageError::RetriesExhausted { source, .. } => source.is_entity_too_large(),
            _ => false,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// With `retry_client_errors` every failure except a size-limit rejection
    /// is retried. Without it, caller-side problems (4xx other than 408/429,
    /// malformed requests, bad keys, missing configuration) fail immediately.
    pub fn is_retryable(&self, retry_client_errors: bool) -> bool {
        match self {
            StorageError::EntityTooLarge(_) | StorageError::RetriesExhausted { .. } => false,
            StorageError::Rejected { status, .. } => {
                retry_client_errors || !(400..500).contains(status) || *status == 408 || *status == 429
            }
            StorageError::InvalidRequest(_)
            | StorageError::InvalidKey(_)
            | StorageError::ConfigError(_) => retry_client_errors,
            StorageError::Transport(_)
            | StorageError::InvalidResponse(_)
            | StorageError::IoError(_) => true,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Remote storage abstraction trait
///
/// Every method performs exactly one remote operation. Retrying and the
/// folder fallback are layered on top by [`crate::RetryingUploader`] and
/// [`crate::upload_with_folder_fallback`], so backends stay simple and
/// test doubles can count calls precisely.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Upload one file and return the descriptor reported by the backend.
    ///
    /// The source is borrowed so that retries resend the same content.
    async fn upload(
        &self,
        source: &UploadSource,
        options: &UploadOptions,
    ) -> StorageResult<StoredObjectDescriptor>;

    /// Delete a stored resource by public id.
    ///
    /// Returns `true` when something was removed and `false` when the
    /// backend reports it as not found.
    async fn destroy(
        &self,
        public_id: &str,
        resource_kind: ResourceKind,
        invalidate: bool,
    ) -> StorageResult<bool>;

    /// Purge derived variants (eager transforms, cached renditions) of a resource.
    async fn delete_derived(&self, public_id: &str, resource_kind: ResourceKind)
        -> StorageResult<()>;

    /// Whether a delivery URL was issued by this backend
    fn owns_url(&self, url: &str) -> bool;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_too_large_never_retryable() {
        let err = StorageError::EntityTooLarge("12 MB".to_string());
        assert!(!err.is_retryable(true));
        assert!(!err.is_retryable(false));
        assert!(err.is_entity_too_large());
    }

    #[test]
    fn test_client_error_classification() {
        let bad_request = StorageError::Rejected {
            status: 400,
            message: "Invalid signature".to_string(),
        };
        assert!(bad_request.is_retryable(true));
        assert!(!bad_request.is_retryable(false));

        let throttled = StorageError::Rejected {
            status: 429,
            message: "Rate limited".to_string(),
        };
        assert!(throttled.is_retryable(false));

        let server = StorageError::Rejected {
            status: 503,
            message: "Unavailable".to_string(),
        };
        assert!(server.is_retryable(false));

        assert!(StorageError::Transport("reset".to_string()).is_retryable(false));
        assert!(!StorageError::ConfigError("missing".to_string()).is_retryable(false));
    }

    #[test]
    fn test_exhausted_keeps_last_cause() {
        let err = StorageError::RetriesExhausted {
            attempts: 4,
            source: Box::new(StorageError::Transport("timed out".to_string())),
        };
        assert!(!err.is_entity_too_large());
        assert!(err.to_string().contains("after 4 attempts"));
        assert!(err.to_string().contains("timed out"));
    }
}
