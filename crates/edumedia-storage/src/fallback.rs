//! Two-phase folder strategy.
//!
//! Phase 1 uploads without the folder qualifier. Only if that fails and the
//! caller asked for a non-blank folder is the upload repeated once, with the
//! folder attached. Each phase is a full retried upload, so a permanently
//! failing backend sees at most `2 * (max_retries + 1)` attempts.

use edumedia_core::{StoredObjectDescriptor, UploadOptions, UploadSource};

use crate::retry::RetryingUploader;
use crate::traits::StorageResult;

pub async fn upload_with_folder_fallback(
    uploader: &RetryingUploader,
    source: &UploadSource,
    options: &UploadOptions,
) -> StorageResult<StoredObjectDescriptor> {
    let first_error = match uploader.upload(source, &options.without_folder()).await {
        Ok(descriptor) => return Ok(descriptor),
        Err(err) => err,
    };

    let Some(folder) = options.qualified_folder() else {
        return Err(first_error);
    };

    // A size rejection will not change with a different destination.
    if first_error.is_entity_too_large() {
        return Err(first_error);
    }

    tracing::warn!(
        error = %first_error,
        folder = %folder,
        filename = %options.filename,
        "Upload without folder failed, retrying with folder"
    );

    let with_folder = options.clone().with_folder(Some(folder.to_string()));
    uploader.upload(source, &with_folder).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::testing::{sample_descriptor, RecordingSleeper, ScriptedStorage};
    use crate::traits::StorageError;
    use std::sync::Arc;

    fn setup(storage: Arc<ScriptedStorage>) -> RetryingUploader {
        RetryingUploader::new(
            storage,
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
        )
    }

    #[tokio::test]
    async fn test_phase_one_success_never_sends_folder() {
        let storage = Arc::new(ScriptedStorage::new(vec![Ok(sample_descriptor("a"))]));
        let options = UploadOptions::new("a.png", "image/png")
            .with_folder(Some("course-101".to_string()));

        upload_with_folder_fallback(&setup(storage.clone()), &UploadSource::from(vec![1]), &options)
            .await
            .unwrap();

        let folders = storage.uploaded_folders();
        assert_eq!(folders, vec![None]);
    }

    #[tokio::test]
    async fn test_no_folder_propagates_phase_one_error() {
        let storage = Arc::new(ScriptedStorage::always_failing());
        let options = UploadOptions::new("a.png", "image/png");

        let err = upload_with_folder_fallback(&setup(storage.clone()), &UploadSource::from(vec![1]), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::RetriesExhausted { attempts: 4, .. }));
        assert_eq!(storage.upload_count(), 4);
    }

    #[tokio::test]
    async fn test_blank_folder_is_treated_as_absent() {
        let storage = Arc::new(ScriptedStorage::always_failing());
        let options = UploadOptions::new("a.png", "image/png").with_folder(Some("  ".to_string()));

        let result =
            upload_with_folder_fallback(&setup(storage.clone()), &UploadSource::from(vec![1]), &options).await;

        assert!(result.is_err());
        assert_eq!(storage.upload_count(), 4);
        assert!(storage.uploaded_folders().iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_folder_phase_runs_once_after_failure() {
        let mut script: Vec<StorageResult<StoredObjectDescriptor>> = (0..4)
            .map(|_| Err(StorageError::Transport("reset".to_string())))
            .collect();
        script.push(Ok(sample_descriptor("course-101/a")));
        let storage = Arc::new(ScriptedStorage::new(script));
        let options = UploadOptions::new("a.png", "image/png")
            .with_folder(Some("course-101".to_string()));

        let descriptor =
            upload_with_folder_fallback(&setup(storage.clone()), &UploadSource::from(vec![1]), &options)
                .await
                .unwrap();

        assert_eq!(descriptor.public_id, "course-101/a");
        let folders = storage.uploaded_folders();
        assert_eq!(folders.len(), 5);
        assert!(folders[..4].iter().all(Option::is_none));
        assert_eq!(folders[4].as_deref(), Some("course-101"));
    }

    #[tokio::test]
    async fn test_both_phases_failing_makes_eight_attempts() {
        let storage = Arc::new(ScriptedStorage::always_failing());
        let options = UploadOptions::new("a.png", "image/png")
            .with_folder(Some("course-101".to_string()));

        let err = upload_with_folder_fallback(&setup(storage.clone()), &UploadSource::from(vec![1]), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::RetriesExhausted { .. }));
        assert_eq!(storage.upload_count(), 8);
    }

    #[tokio::test]
    async fn test_entity_too_large_skips_folder_phase() {
        let storage = Arc::new(ScriptedStorage::new(vec![Err(StorageError::EntityTooLarge(
            "limit".to_string(),
        ))]));
        let options = UploadOptions::new("a.png", "image/png")
            .with_folder(Some("course-101".to_string()));

        let err = upload_with_folder_fallback(&setup(storage.clone()), &UploadSource::from(vec![1]), &options)
            .await
            .unwrap_err();

        assert!(err.is_entity_too_large());
        assert_eq!(storage.upload_count(), 1);
    }
}
