//! Upload orchestrator: validate, optionally transcode, upload with retries.

use std::sync::Arc;

use bytes::Bytes;
use edumedia_core::{
    AppError, StorageBackend, StoredObjectDescriptor, UploadOptions, UploadRequest,
    UploadSettings, UploadSource,
};
use edumedia_storage::{
    upload_with_folder_fallback, RemoteStorage, RetryPolicy, RetryingUploader, Sleeper,
    StorageError, TokioSleeper,
};

use super::destination::DestinationRegistry;
use crate::image::ImageTranscoder;
use crate::validator::{normalize_mime_type, sanitize_filename, validate_payload, with_extension};

/// Image types uploaded as-is: re-encoding would drop vector data or animation.
const PASSTHROUGH_IMAGE_TYPES: [&str; 2] = ["image/svg+xml", "image/gif"];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Stateless between calls; share it behind an `Arc`.
#[derive(Clone)]
pub struct UploadOrchestrator {
    uploader: RetryingUploader,
    settings: UploadSettings,
    destinations: DestinationRegistry,
}

impl UploadOrchestrator {
    pub fn new(storage: Arc<dyn RemoteStorage>, settings: UploadSettings) -> Self {
        Self::with_sleeper(storage, settings, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        storage: Arc<dyn RemoteStorage>,
        settings: UploadSettings,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let uploader = RetryingUploader::new(storage, RetryPolicy::from(&settings), sleeper);
        Self {
            uploader,
            settings,
            destinations: DestinationRegistry::default(),
        }
    }

    pub fn with_destinations(mut self, destinations: DestinationRegistry) -> Self {
        self.destinations = destinations;
        self
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    pub fn backend_type(&self) -> StorageBackend {
        self.uploader.storage().backend_type()
    }

    /// Upload a file, the library counterpart of the admin upload form.
    #[allow(clippy::too_many_arguments)]
    pub async fn upload_image(
        &self,
        source: impl Into<UploadSource>,
        filename: &str,
        content_type: &str,
        size: u64,
        folder: Option<String>,
        target_height: Option<u32>,
        quality: Option<String>,
    ) -> Result<StoredObjectDescriptor, AppError> {
        let mut request = UploadRequest::new(source, filename, content_type, size);
        request.folder = folder;
        request.target_height = target_height;
        request.quality = quality;
        self.store(request).await
    }

    /// Validate, transcode large images, and upload with the two-phase
    /// folder strategy. The descriptor is returned as the backend reported it.
    #[tracing::instrument(
        skip(self, request),
        fields(
            filename = %request.original_filename,
            content_type = %request.content_type,
            size_bytes = request.declared_size,
            folder = ?request.folder,
        )
    )]
    pub async fn store(&self, request: UploadRequest) -> Result<StoredObjectDescriptor, AppError> {
        validate_payload(&request).await?;

        let mut filename = sanitize_filename(&request.original_filename)?;
        let mut content_type = normalize_mime_type(&request.content_type);
        let mut source = request.source.clone();

        if self.should_transcode(&content_type, request.declared_size) {
            let data = match &request.source {
                UploadSource::Bytes(data) => data.clone(),
                UploadSource::Path(path) => Bytes::from(tokio::fs::read(path).await?),
            };

            let constraints = match request.target_height {
                Some(height) => self.settings.transcode.for_target_height(height),
                None => self.settings.transcode,
            };

            let transcoded = ImageTranscoder::transcode_async(data, constraints)
                .await
                .map_err(|e| AppError::upload_failed("Failed to optimize image before upload", e))?;

            tracing::info!(
                original_size = transcoded.original_size,
                new_size = transcoded.data.len(),
                width = transcoded.width,
                height = transcoded.height,
                saved = %format!("{:.1}%", transcoded.compression_ratio() * 100.0),
                "Image transcoded before upload"
            );

            filename = with_extension(&filename, transcoded.format.extension());
            content_type = transcoded.format.to_mime_type().to_string();
            source = UploadSource::Bytes(transcoded.data);
        }

        let mut options = UploadOptions::new(filename, content_type)
            .with_folder(request.folder.clone())
            .with_quality(request.quality.clone());
        self.destinations.apply(&mut options);

        let descriptor = upload_with_folder_fallback(&self.uploader, &source, &options)
            .await
            .map_err(|e| Self::upload_error(e, request.declared_size))?;

        tracing::info!(
            public_id = %descriptor.public_id,
            resource_kind = %descriptor.resource_kind,
            "Upload stored"
        );

        Ok(descriptor)
    }

    fn should_transcode(&self, content_type: &str, size: u64) -> bool {
        content_type.starts_with("image/")
            && !PASSTHROUGH_IMAGE_TYPES.contains(&content_type)
            && size > self.settings.transcode_threshold_bytes()
    }

    fn upload_error(err: StorageError, size: u64) -> AppError {
        if err.is_entity_too_large() {
            return AppError::PayloadTooLarge(format!(
                "The file ({:.1} MB) exceeds the upload limit of the media storage plan. \
                 Try a smaller file or upgrade the storage plan.",
                size as f64 / BYTES_PER_MB
            ));
        }
        AppError::upload_failed("Failed to upload file", err)
    }
}
