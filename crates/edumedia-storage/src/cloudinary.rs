//! Cloudinary REST backend.
//!
//! Uploads and destroys are signed requests (SHA-256 over the sorted
//! parameters plus the API secret). Derived-resource purges go through the
//! admin API with basic auth.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use edumedia_core::{
    CloudinaryCredentials, ResourceKind, StoredObjectDescriptor, UploadOptions, UploadSource,
};
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio_util::io::ReaderStream;
use url::Url;

use crate::traits::{RemoteStorage, StorageError, StorageResult};
use crate::StorageBackend;

/// Chunk size used when streaming in-memory payloads with progress reporting
const PROGRESS_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    format: Option<String>,
    resource_type: ResourceKind,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    bytes: Option<u64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    version: Option<u64>,
}

impl From<UploadResponse> for StoredObjectDescriptor {
    fn from(r: UploadResponse) -> Self {
        StoredObjectDescriptor {
            secure_url: r.secure_url,
            public_id: r.public_id,
            format: r.format.unwrap_or_default(),
            resource_kind: r.resource_type,
            duration: r.duration,
            bytes: r.bytes,
            width: r.width,
            height: r.height,
            version: r.version,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary storage implementation
#[derive(Clone)]
pub struct CloudinaryStorage {
    client: reqwest::Client,
    credentials: CloudinaryCredentials,
}

impl CloudinaryStorage {
    pub fn new(credentials: CloudinaryCredentials) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(credentials.timeout_secs))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    fn endpoint(&self, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.credentials.api_base, self.credentials.cloud_name, kind, action
        )
    }

    fn derived_endpoint(&self, kind: ResourceKind) -> String {
        format!(
            "{}/v1_1/{}/resources/{}/upload",
            self.credentials.api_base, self.credentials.cloud_name, kind
        )
    }

    /// Signed parameters for an upload, without the file itself.
    fn upload_params(options: &UploadOptions, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("timestamp", timestamp.to_string());
        params.insert("use_filename", options.use_filename.to_string());
        params.insert("unique_filename", options.unique_filename.to_string());
        params.insert("overwrite", options.overwrite.to_string());
        params.insert("transformation", format!("q_{}", options.quality));

        if let Some(folder) = options.qualified_folder() {
            params.insert("folder", folder.to_string());
        }
        if let Some(deferred) = options.deferred_processing {
            params.insert("async", deferred.to_string());
        }
        if let Some(eager) = options.eager_directive() {
            params.insert("eager", eager);
            if options.eager_async {
                params.insert("eager_async", "true".to_string());
            }
        }

        params
    }

    /// SHA-256 signature over `k=v&k=v...` (keys sorted) followed by the secret.
    pub fn sign(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
        let to_sign = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_fields(&self, params: &BTreeMap<&'static str, String>) -> Vec<(&'static str, String)> {
        let signature = Self::sign(params, &self.credentials.api_secret);
        let mut fields: Vec<(&'static str, String)> =
            params.iter().map(|(k, v)| (*k, v.clone())).collect();
        fields.push(("api_key", self.credentials.api_key.clone()));
        fields.push(("signature", signature));
        fields.push(("signature_algorithm", "sha256".to_string()));
        fields
    }

    async fn file_part(&self, source: &UploadSource, options: &UploadOptions) -> StorageResult<Part> {
        let track_progress = options.content_type.to_lowercase().starts_with("video/");
        let filename = options.filename.clone();

        let (body, length) = match source {
            UploadSource::Bytes(data) => {
                let length = data.len() as u64;
                if track_progress {
                    let chunks: Vec<std::io::Result<Bytes>> = (0..data.len())
                        .step_by(PROGRESS_CHUNK_SIZE)
                        .map(|start| {
                            let end = (start + PROGRESS_CHUNK_SIZE).min(data.len());
                            Ok(data.slice(start..end))
                        })
                        .collect();
                    let stream = with_progress(futures::stream::iter(chunks), length, filename.clone());
                    (Body::wrap_stream(stream), length)
                } else {
                    (Body::from(data.clone()), length)
                }
            }
            UploadSource::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let length = file.metadata().await?.len();
                let stream = ReaderStream::new(file);
                if track_progress {
                    (
                        Body::wrap_stream(with_progress(stream, length, filename.clone())),
                        length,
                    )
                } else {
                    (Body::wrap_stream(stream), length)
                }
            }
        };

        Part::stream_with_length(body, length)
            .file_name(filename)
            .mime_str(&options.content_type)
            .map_err(|e| StorageError::InvalidRequest(format!("Invalid content type: {}", e)))
    }

    /// Map a non-success response to a storage error.
    async fn error_from_response(response: reqwest::Response) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        // Size limits are reported either as 413 or as a 400 with this message.
        if status == StatusCode::PAYLOAD_TOO_LARGE
            || message.to_lowercase().contains("file size too large")
        {
            return StorageError::EntityTooLarge(message);
        }

        StorageError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// Log upload progress in 10% steps as chunks are handed to the HTTP client.
fn with_progress<S>(
    stream: S,
    total: u64,
    filename: String,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
{
    let mut sent: u64 = 0;
    let mut next_mark: u64 = 10;

    stream.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            let percent = if total == 0 { 100 } else { sent * 100 / total };
            if percent >= next_mark {
                tracing::debug!(
                    filename = %filename,
                    sent_bytes = sent,
                    total_bytes = total,
                    percent = percent,
                    "Upload progress"
                );
                next_mark = (percent / 10 + 1) * 10;
            }
        }
        chunk
    })
}

#[async_trait]
impl RemoteStorage for CloudinaryStorage {
    async fn upload(
        &self,
        source: &UploadSource,
        options: &UploadOptions,
    ) -> StorageResult<StoredObjectDescriptor> {
        let params = Self::upload_params(options, chrono::Utc::now().timestamp());
        let mut form = Form::new();
        for (key, value) in self.signed_fields(&params) {
            form = form.text(key, value);
        }
        form = form.part("file", self.file_part(source, options).await?);

        let url = self.endpoint(options.resource_kind, "upload");
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    cloud = %self.credentials.cloud_name,
                    filename = %options.filename,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Cloudinary upload request failed"
                );
                StorageError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            tracing::error!(
                error = %err,
                cloud = %self.credentials.cloud_name,
                filename = %options.filename,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cloudinary upload rejected"
            );
            return Err(err);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            cloud = %self.credentials.cloud_name,
            public_id = %body.public_id,
            folder = ?options.qualified_folder(),
            size_bytes = ?body.bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(body.into())
    }

    async fn destroy(
        &self,
        public_id: &str,
        resource_kind: ResourceKind,
        invalidate: bool,
    ) -> StorageResult<bool> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        if invalidate {
            params.insert("invalidate", "true".to_string());
        }

        let response = self
            .client
            .post(self.endpoint(resource_kind, "destroy"))
            .form(&self.signed_fields(&params))
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => {
                tracing::info!(public_id = %public_id, kind = %resource_kind, "Cloudinary resource destroyed");
                Ok(true)
            }
            "not found" => Ok(false),
            other => Err(StorageError::InvalidResponse(format!(
                "Unexpected destroy result: {}",
                other
            ))),
        }
    }

    async fn delete_derived(
        &self,
        public_id: &str,
        resource_kind: ResourceKind,
    ) -> StorageResult<()> {
        let response = self
            .client
            .delete(self.derived_endpoint(resource_kind))
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .query(&[("public_ids[]", public_id), ("keep_original", "true")])
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        tracing::debug!(public_id = %public_id, kind = %resource_kind, "Cloudinary derived resources purged");
        Ok(())
    }

    fn owns_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        matches!(parsed.scheme(), "http" | "https")
            && parsed
                .host_str()
                .is_some_and(|host| host.eq_ignore_ascii_case(&self.credentials.delivery_host))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Cloudinary
    }
}
