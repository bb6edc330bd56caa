//! Multipart upload form parsing

use axum::extract::Multipart;
use edumedia_core::{AppError, UploadRequest};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::constants::{
    DEFAULT_CONTENT_TYPE, FIELD_FILE, FIELD_FOLDER, FIELD_QUALITY, FIELD_TARGET_HEIGHT,
};
use crate::error::HttpAppError;

/// An upload form whose file part has been spooled to disk.
///
/// The temp file is removed when this value is dropped, so it must outlive
/// the upload of `request`.
pub struct SpooledUpload {
    pub request: UploadRequest,
    _spool: NamedTempFile,
}

/// Read the upload form, streaming the `file` part into a temp file.
///
/// Only one field named "file" is accepted. Text fields `folder`,
/// `target_height` and `quality` are optional; unknown fields are ignored.
pub async fn extract_upload_form(mut multipart: Multipart) -> Result<SpooledUpload, HttpAppError> {
    let mut spooled: Option<(NamedTempFile, u64)> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut folder: Option<String> = None;
    let mut target_height: Option<u32> = None;
    let mut quality: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FIELD_FILE => {
                if spooled.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    )
                    .into());
                }
                filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());

                let spool = NamedTempFile::new()
                    .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;
                let mut file = tokio::fs::File::create(spool.path())
                    .await
                    .map_err(AppError::from)?;

                let mut written: u64 = 0;
                while let Some(chunk) = field.chunk().await? {
                    file.write_all(&chunk).await.map_err(AppError::from)?;
                    written += chunk.len() as u64;
                }
                file.flush().await.map_err(AppError::from)?;

                spooled = Some((spool, written));
            }
            FIELD_FOLDER => folder = Some(field.text().await?),
            FIELD_QUALITY => quality = Some(field.text().await?),
            FIELD_TARGET_HEIGHT => {
                let value = field.text().await?;
                target_height = parse_target_height(&value)?;
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let (spool, size) =
        spooled.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    let mut request = UploadRequest::new(
        spool.path().to_path_buf(),
        filename.unwrap_or_else(|| "unknown".to_string()),
        content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        size,
    );
    request.folder = folder.filter(|f| !f.trim().is_empty());
    request.target_height = target_height;
    request.quality = quality.filter(|q| !q.trim().is_empty());

    Ok(SpooledUpload {
        request,
        _spool: spool,
    })
}

/// Blank means "use the default bounds"; otherwise a positive integer.
fn parse_target_height(value: &str) -> Result<Option<u32>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<u32>() {
        Ok(height) if height > 0 => Ok(Some(height)),
        _ => Err(AppError::InvalidInput(format!(
            "target_height must be a positive integer, got '{}'",
            value
        ))),
    }
}
