//! Test doubles for the storage layer.
//!
//! Compiled for this crate's tests and, behind the `test-utils` feature, for
//! the tests of crates that drive uploads through [`RemoteStorage`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use edumedia_core::{ResourceKind, StoredObjectDescriptor, UploadOptions, UploadSource};

use crate::retry::Sleeper;
use crate::traits::{RemoteStorage, StorageError, StorageResult};
use crate::StorageBackend;

/// URL prefix that [`ScriptedStorage`] claims as its own
pub const SCRIPTED_URL_PREFIX: &str = "https://res.example.test/demo/";

/// Sleeper that returns immediately and records every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.recorded().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// One recorded call to [`RemoteStorage::upload`]
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub options: UploadOptions,
    /// Length of in-memory content, `None` for path sources
    pub payload_len: Option<usize>,
    pub payload: Option<Vec<u8>>,
}

/// Storage double that replays a scripted sequence of upload results.
///
/// Once the script is exhausted every upload fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedStorage {
    script: Mutex<VecDeque<StorageResult<StoredObjectDescriptor>>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    destroyed: Mutex<Vec<(String, ResourceKind, bool)>>,
    derived_purged: Mutex<Vec<(String, ResourceKind)>>,
    fail_destroy: bool,
    fail_delete_derived: bool,
}

impl ScriptedStorage {
    pub fn new(script: Vec<StorageResult<StoredObjectDescriptor>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    /// Storage whose destroy and derived-purge calls fail.
    pub fn failing_deletes() -> Self {
        Self {
            fail_destroy: true,
            fail_delete_derived: true,
            ..Default::default()
        }
    }

    pub fn with_failing_delete_derived(mut self) -> Self {
        self.fail_delete_derived = true;
        self
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads().len()
    }

    pub fn uploaded_folders(&self) -> Vec<Option<String>> {
        self.uploads()
            .into_iter()
            .map(|u| u.options.folder)
            .collect()
    }

    pub fn destroyed(&self) -> Vec<(String, ResourceKind, bool)> {
        self.destroyed.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn derived_purged(&self) -> Vec<(String, ResourceKind)> {
        self.derived_purged
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Total number of calls of any kind.
    pub fn call_count(&self) -> usize {
        self.upload_count() + self.destroyed().len() + self.derived_purged().len()
    }
}

#[async_trait]
impl RemoteStorage for ScriptedStorage {
    async fn upload(
        &self,
        source: &UploadSource,
        options: &UploadOptions,
    ) -> StorageResult<StoredObjectDescriptor> {
        let payload = match source {
            UploadSource::Bytes(bytes) => Some(bytes.to_vec()),
            UploadSource::Path(_) => None,
        };
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(RecordedUpload {
                options: options.clone(),
                payload_len: source.in_memory_len(),
                payload,
            });
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        next.unwrap_or_else(|| Err(StorageError::Transport("connection refused".to_string())))
    }

    async fn destroy(
        &self,
        public_id: &str,
        resource_kind: ResourceKind,
        invalidate: bool,
    ) -> StorageResult<bool> {
        if let Ok(mut destroyed) = self.destroyed.lock() {
            destroyed.push((public_id.to_string(), resource_kind, invalidate));
        }
        if self.fail_destroy {
            return Err(StorageError::Rejected {
                status: 500,
                message: "destroy failed".to_string(),
            });
        }
        Ok(true)
    }

    async fn delete_derived(
        &self,
        public_id: &str,
        resource_kind: ResourceKind,
    ) -> StorageResult<()> {
        if let Ok(mut purged) = self.derived_purged.lock() {
            purged.push((public_id.to_string(), resource_kind));
        }
        if self.fail_delete_derived {
            return Err(StorageError::Transport("purge timed out".to_string()));
        }
        Ok(())
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(SCRIPTED_URL_PREFIX)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Cloudinary
    }
}

/// Descriptor as a successful image upload would report it.
pub fn sample_descriptor(public_id: &str) -> StoredObjectDescriptor {
    StoredObjectDescriptor {
        secure_url: format!("{}image/upload/v1700000000/{}.jpg", SCRIPTED_URL_PREFIX, public_id),
        public_id: public_id.to_string(),
        format: "jpg".to_string(),
        resource_kind: ResourceKind::Image,
        duration: None,
        bytes: Some(1024),
        width: Some(640),
        height: Some(480),
        version: Some(1_700_000_000),
    }
}
