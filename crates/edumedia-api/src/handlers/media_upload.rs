use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use edumedia_core::StoredObjectDescriptor;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_upload_form;

/// Upload media handler
///
/// Accepts a multipart form with a `file` part and optional `folder`,
/// `target_height` and `quality` fields, and responds with the descriptor
/// the storage backend reported (HTTP 201 Created).
///
/// # Errors
/// - `AppError::InvalidInput` - missing, empty or unreadable file, bad parameters
/// - `AppError::PayloadTooLarge` - body limit or storage plan limit exceeded
/// - `AppError::UploadFailed` - transcoding failed or retries were exhausted
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StoredObjectDescriptor>), HttpAppError> {
    let upload = extract_upload_form(multipart).await?;

    tracing::info!(
        filename = %upload.request.original_filename,
        content_type = %upload.request.content_type,
        size_bytes = upload.request.declared_size,
        folder = ?upload.request.folder,
        "Upload received"
    );

    let descriptor = state.orchestrator.store(upload.request.clone()).await?;
    // Spool file lives until here.
    drop(upload);

    Ok((StatusCode::CREATED, Json(descriptor)))
}
