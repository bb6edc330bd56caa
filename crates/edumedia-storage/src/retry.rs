//! Bounded retry around single-shot uploads.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use edumedia_core::{StoredObjectDescriptor, UploadOptions, UploadSettings, UploadSource};

use crate::traits::{RemoteStorage, StorageError, StorageResult};

/// Waits between attempts. Injected so tests can run without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    /// Fixed delay before each retry
    pub delay: Duration,
    pub retry_client_errors: bool,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl From<&UploadSettings> for RetryPolicy {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            delay: settings.retry_delay,
            retry_client_errors: settings.retry_client_errors,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&UploadSettings::default())
    }
}

/// Calls [`RemoteStorage::upload`] until it succeeds or the policy gives up.
///
/// The attempt counter lives on the stack of each call, so one uploader can
/// be shared by concurrent requests.
#[derive(Clone)]
pub struct RetryingUploader {
    storage: Arc<dyn RemoteStorage>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingUploader {
    pub fn new(storage: Arc<dyn RemoteStorage>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            storage,
            policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &Arc<dyn RemoteStorage> {
        &self.storage
    }

    /// Upload with a fixed delay between attempts.
    ///
    /// Returns the first success. A non-retryable error is returned as-is
    /// after the attempt that produced it; once the budget is spent the last
    /// error is wrapped in [`StorageError::RetriesExhausted`].
    pub async fn upload(
        &self,
        source: &UploadSource,
        options: &UploadOptions,
    ) -> StorageResult<StoredObjectDescriptor> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.storage.upload(source, options).await {
                Ok(descriptor) => {
                    if attempt > 1 {
                        tracing::info!(
                            attempt = attempt,
                            public_id = %descriptor.public_id,
                            "Upload succeeded after retry"
                        );
                    }
                    return Ok(descriptor);
                }
                Err(err) if !err.is_retryable(self.policy.retry_client_errors) => {
                    tracing::warn!(
                        error = %err,
                        attempt = attempt,
                        filename = %options.filename,
                        "Upload failed with non-retryable error"
                    );
                    return Err(err);
                }
                Err(err) if attempt >= max_attempts => {
                    tracing::error!(
                        error = %err,
                        attempts = attempt,
                        filename = %options.filename,
                        "Upload failed, retries exhausted"
                    );
                    return Err(StorageError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = self.policy.delay.as_millis() as u64,
                        filename = %options.filename,
                        "Upload failed, retrying"
                    );
                    self.sleeper.sleep(self.policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_descriptor, RecordingSleeper, ScriptedStorage};

    fn uploader(storage: Arc<ScriptedStorage>, sleeper: Arc<RecordingSleeper>) -> RetryingUploader {
        RetryingUploader::new(storage, RetryPolicy::default(), sleeper)
    }

    fn options() -> UploadOptions {
        UploadOptions::new("photo.jpg", "image/jpeg")
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_sleep() {
        let storage = Arc::new(ScriptedStorage::new(vec![Ok(sample_descriptor("photo"))]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = uploader(storage.clone(), sleeper.clone())
            .upload(&UploadSource::from(vec![1, 2, 3]), &options())
            .await;

        assert!(result.is_ok());
        assert_eq!(storage.upload_count(), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_success_on_third_attempt_sleeps_twice() {
        let storage = Arc::new(ScriptedStorage::new(vec![
            Err(StorageError::Transport("connection reset".to_string())),
            Err(StorageError::Rejected {
                status: 500,
                message: "Internal".to_string(),
            }),
            Ok(sample_descriptor("photo")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = uploader(storage.clone(), sleeper.clone())
            .upload(&UploadSource::from(vec![1, 2, 3]), &options())
            .await
            .unwrap();

        assert_eq!(result.public_id, "photo");
        assert_eq!(storage.upload_count(), 3);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_secs(5), Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_permanent_failure_makes_four_attempts() {
        let storage = Arc::new(ScriptedStorage::always_failing());
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = uploader(storage.clone(), sleeper.clone())
            .upload(&UploadSource::from(vec![1, 2, 3]), &options())
            .await
            .unwrap_err();

        assert_eq!(storage.upload_count(), 4);
        assert_eq!(sleeper.recorded().len(), 3);
        match err {
            StorageError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*source, StorageError::Transport(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_entity_too_large_is_not_retried() {
        let storage = Arc::new(ScriptedStorage::new(vec![Err(StorageError::EntityTooLarge(
            "File size too large".to_string(),
        ))]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = uploader(storage.clone(), sleeper.clone())
            .upload(&UploadSource::from(vec![1, 2, 3]), &options())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::EntityTooLarge(_)));
        assert_eq!(storage.upload_count(), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_client_errors_fail_fast_when_disabled() {
        let storage = Arc::new(ScriptedStorage::new(vec![Err(StorageError::Rejected {
            status: 401,
            message: "Invalid API key".to_string(),
        })]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy {
            retry_client_errors: false,
            ..RetryPolicy::default()
        };

        let err = RetryingUploader::new(storage.clone(), policy, sleeper.clone())
            .upload(&UploadSource::from(vec![1]), &options())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Rejected { status: 401, .. }));
        assert_eq!(storage.upload_count(), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_zero_retries_makes_one_attempt() {
        let storage = Arc::new(ScriptedStorage::always_failing());
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };

        let err = RetryingUploader::new(storage.clone(), policy, sleeper.clone())
            .upload(&UploadSource::from(vec![1]), &options())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(storage.upload_count(), 1);
        assert!(sleeper.recorded().is_empty());
    }
}
