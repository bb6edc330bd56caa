use edumedia_core::{AppError, UploadRequest, UploadSource};
use std::path::Path;

const MAX_FILENAME_LENGTH: usize = 255;

/// Validation errors for incoming uploads
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty file")]
    EmptyFile,

    #[error("File size mismatch: declared {declared} bytes, received {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("Uploaded file is not readable: {0}")]
    Unreadable(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Check that the payload is present and matches its declared size.
///
/// In-memory payloads are measured directly; path payloads through file
/// metadata, without reading the content.
pub async fn validate_payload(request: &UploadRequest) -> Result<(), ValidationError> {
    let actual = match &request.source {
        UploadSource::Bytes(data) => data.len() as u64,
        UploadSource::Path(path) => {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| ValidationError::Unreadable(e.to_string()))?;
            if !metadata.is_file() {
                return Err(ValidationError::Unreadable(format!(
                    "{} is not a regular file",
                    path.display()
                )));
            }
            metadata.len()
        }
    };

    if actual == 0 {
        return Err(ValidationError::EmptyFile);
    }

    if actual != request.declared_size {
        return Err(ValidationError::SizeMismatch {
            declared: request.declared_size,
            actual,
        });
    }

    Ok(())
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.contains("..") {
        return Err(ValidationError::InvalidFilename(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let filename_only = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// MIME type without parameters, lowercased (`Image/JPEG; q=1` -> `image/jpeg`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Replace (or add) the extension of `filename`.
pub fn with_extension(filename: &str, extension: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    };
    format!("{}.{}", stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_validate_payload_accepts_matching_size() {
        let request = UploadRequest::new(vec![1, 2, 3], "a.png", "image/png", 3);
        assert!(validate_payload(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_payload_rejects_empty() {
        let request = UploadRequest::new(Bytes::new(), "a.png", "image/png", 0);
        assert!(matches!(
            validate_payload(&request).await,
            Err(ValidationError::EmptyFile)
        ));
    }

    #[tokio::test]
    async fn test_validate_payload_rejects_size_mismatch() {
        let request = UploadRequest::new(vec![1, 2, 3], "a.png", "image/png", 10);
        assert!(matches!(
            validate_payload(&request).await,
            Err(ValidationError::SizeMismatch {
                declared: 10,
                actual: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_validate_payload_checks_path_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        tokio::fs::write(&path, b"12345").await.unwrap();

        let ok = UploadRequest::new(path.clone(), "upload.bin", "application/octet-stream", 5);
        assert!(validate_payload(&ok).await.is_ok());

        let missing = UploadRequest::new(dir.path().join("gone.bin"), "gone.bin", "application/octet-stream", 5);
        assert!(matches!(
            validate_payload(&missing).await,
            Err(ValidationError::Unreadable(_))
        ));
    }

    #[test]
    fn test_sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("foo/../bar.png").is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("image.png").unwrap(), "image.png");
        assert_eq!(sanitize_filename("my-file_1.jpg").unwrap(), "my-file_1.jpg");
        assert_eq!(sanitize_filename("/tmp/Course Cover.PNG").unwrap(), "Course_Cover.PNG");
        assert_eq!(sanitize_filename("???").unwrap(), "file");
    }

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("Image/JPEG; charset=binary"), "image/jpeg");
        assert_eq!(normalize_mime_type("video/mp4"), "video/mp4");
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("photo.png", "jpg"), "photo.jpg");
        assert_eq!(with_extension("photo.final.heic", "webp"), "photo.final.webp");
        assert_eq!(with_extension("scan", "jpg"), "scan.jpg");
        assert_eq!(with_extension(".hidden", "jpg"), ".hidden.jpg");
    }

    #[test]
    fn test_validation_error_maps_to_invalid_input() {
        let err: AppError = ValidationError::EmptyFile.into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
