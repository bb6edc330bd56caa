use crate::keys::{public_id_from_filename, validate_public_id};
use crate::traits::{RemoteStorage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use edumedia_core::{ResourceKind, StoredObjectDescriptor, UploadOptions, UploadSource};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Files are written to `{base_path}/{kind}/upload/{public_id}.{ext}` and
/// handed out as `{base_url}/{kind}/upload/v{version}/{public_id}.{ext}`,
/// the same URL layout the hosted service uses.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/edumedia/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve `kind` and the caller's content type to a concrete kind.
    fn concrete_kind(kind: ResourceKind, content_type: &str) -> ResourceKind {
        match kind {
            ResourceKind::Auto => ResourceKind::from_content_type(content_type),
            other => other,
        }
    }

    fn kind_dir(&self, kind: ResourceKind) -> PathBuf {
        self.base_path.join(kind.as_str()).join("upload")
    }

    fn public_id_for(options: &UploadOptions) -> StorageResult<String> {
        let base = if options.use_filename {
            public_id_from_filename(&options.filename)
        } else {
            Uuid::new_v4().simple().to_string()
        };

        let name = if options.use_filename && options.unique_filename {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("{}_{}", base, &suffix[..6])
        } else {
            base
        };

        let public_id = match options.qualified_folder() {
            Some(folder) => format!("{}/{}", folder.trim_matches('/'), name),
            None => name,
        };

        validate_public_id(&public_id)?;
        Ok(public_id)
    }

    fn extension_for(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Find the stored file for a public id, whatever its extension.
    async fn find_file(&self, public_id: &str, kind: ResourceKind) -> StorageResult<Option<PathBuf>> {
        validate_public_id(public_id)?;

        let candidate = self.kind_dir(kind).join(public_id);
        let (Some(dir), Some(stem)) = (candidate.parent(), candidate.file_name()) else {
            return Ok(None);
        };

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem() == Some(stem) && path.is_file() {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl RemoteStorage for LocalStorage {
    async fn upload(
        &self,
        source: &UploadSource,
        options: &UploadOptions,
    ) -> StorageResult<StoredObjectDescriptor> {
        let kind = Self::concrete_kind(options.resource_kind, &options.content_type);
        let public_id = Self::public_id_for(options)?;
        let format = Self::extension_for(&options.filename);
        let path = self.kind_dir(kind).join(format!("{}.{}", public_id, format));

        if !options.overwrite && fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::Rejected {
                status: 409,
                message: format!("Resource {} already exists", public_id),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        let size = match source {
            UploadSource::Bytes(data) => {
                let mut file = fs::File::create(&path).await?;
                file.write_all(data).await?;
                file.sync_all().await?;
                data.len() as u64
            }
            UploadSource::Path(src) => fs::copy(src, &path).await?,
        };

        let version = chrono::Utc::now().timestamp().max(0) as u64;
        let secure_url = format!(
            "{}/{}/upload/v{}/{}.{}",
            self.base_url, kind, version, public_id, format
        );

        tracing::info!(
            path = %path.display(),
            public_id = %public_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredObjectDescriptor {
            secure_url,
            public_id,
            format,
            resource_kind: kind,
            duration: None,
            bytes: Some(size),
            width: None,
            height: None,
            version: Some(version),
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        resource_kind: ResourceKind,
        _invalidate: bool,
    ) -> StorageResult<bool> {
        let Some(path) = self.find_file(public_id, resource_kind).await? else {
            return Ok(false);
        };

        fs::remove_file(&path).await?;

        tracing::info!(
            path = %path.display(),
            public_id = %public_id,
            "Local storage delete successful"
        );

        Ok(true)
    }

    async fn delete_derived(
        &self,
        _public_id: &str,
        _resource_kind: ResourceKind,
    ) -> StorageResult<()> {
        // No derived variants are generated locally.
        Ok(())
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/", self.base_url))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use crate::keys::parse_resource_url;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:3000/media";

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, BASE_URL.to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_uses_hosted_url_layout() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let options = UploadOptions::new("Cover Photo.PNG", "image/png")
            .with_folder(Some("course-101".to_string()));
        let descriptor = storage
            .upload(&UploadSource::from(b"png-bytes".to_vec()), &options)
            .await
            .unwrap();

        assert_eq!(descriptor.resource_kind, ResourceKind::Image);
        assert_eq!(descriptor.format, "png");
        assert_eq!(descriptor.bytes, Some(9));
        assert!(descriptor.public_id.starts_with("course-101/Cover_Photo_"));
        assert!(storage.owns_url(&descriptor.secure_url));

        let locator = parse_resource_url(&descriptor.secure_url).unwrap();
        assert_eq!(locator.public_id, descriptor.public_id);
        assert_eq!(locator.resource_kind, ResourceKind::Image);

        let stored = dir
            .path()
            .join("image/upload")
            .join(format!("{}.png", descriptor.public_id));
        assert_eq!(tokio::fs::read(stored).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_from_path() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir.path().join("store")).await;
        let src = dir.path().join("lesson.mp4");
        tokio::fs::write(&src, b"video").await.unwrap();

        let descriptor = storage
            .upload(
                &UploadSource::Path(src),
                &UploadOptions::new("lesson.mp4", "video/mp4"),
            )
            .await
            .unwrap();

        assert_eq!(descriptor.resource_kind, ResourceKind::Video);
        assert_eq!(descriptor.bytes, Some(5));
        assert!(descriptor.secure_url.contains("/video/upload/v"));
    }

    #[tokio::test]
    async fn test_destroy_removes_file() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let descriptor = storage
            .upload(
                &UploadSource::from(b"data".to_vec()),
                &UploadOptions::new("notes.pdf", "application/pdf"),
            )
            .await
            .unwrap();

        assert_eq!(descriptor.resource_kind, ResourceKind::Raw);
        assert!(storage
            .destroy(&descriptor.public_id, ResourceKind::Raw, true)
            .await
            .unwrap());
        assert!(!storage
            .destroy(&descriptor.public_id, ResourceKind::Raw, true)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.destroy("../../etc/passwd", ResourceKind::Image, true).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let options = UploadOptions::new("a.png", "image/png").with_folder(Some("../escape".to_string()));
        let result = storage.upload(&UploadSource::from(vec![1]), &options).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_owns_url_requires_base_prefix() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        assert!(storage.owns_url("http://localhost:3000/media/image/upload/v1/a.png"));
        assert!(!storage.owns_url("http://localhost:3000/mediax/image/upload/v1/a.png"));
        assert!(!storage.owns_url("https://res.cloudinary.com/demo/image/upload/v1/a.png"));
    }
}
