use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    url: Option<String>,
}

/// Delete media by delivery URL.
///
/// Best effort: always 204, whether the resource was removed, was already
/// gone, or the backend could not be reached.
#[tracing::instrument(skip(state))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> StatusCode {
    match state.deletion.delete(query.url.as_deref()).await {
        Some(outcome) => tracing::info!(
            public_id = %outcome.public_id,
            removed = outcome.removed,
            "Media deleted"
        ),
        None => tracing::debug!("Nothing deleted"),
    }
    StatusCode::NO_CONTENT
}
