//! Edumedia Storage Library
//!
//! Remote storage abstraction for the upload pipeline: the single-shot
//! [`RemoteStorage`] trait and its backends, the bounded retry loop, the
//! two-phase folder strategy, and best-effort deletion by delivery URL.
//!
//! # Resource URL format
//!
//! Every backend hands out delivery URLs in the hosted service's layout:
//!
//! `{base}/{resource_kind}/upload/v{version}/{public_id}.{ext}`
//!
//! The deletion client recovers the public id and kind from that layout, so
//! backends must not deviate from it. Parsing lives in the `keys` module.

#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
pub mod deletion;
pub mod factory;
pub mod fallback;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod retry;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStorage;
pub use deletion::{DeletionOutcome, ResourceDeletionClient};
pub use edumedia_core::StorageBackend;
pub use factory::create_storage;
pub use fallback::upload_with_folder_fallback;
pub use keys::{parse_resource_url, ResourceLocator};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use retry::{RetryPolicy, RetryingUploader, Sleeper, TokioSleeper};
pub use traits::{RemoteStorage, StorageError, StorageResult};
