//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; any `AppError`
//! converts with `?` and renders as an [`ErrorResponse`] body.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use edumedia_core::{AppError, ErrorMetadata, LogLevel};
pub use edumedia_infra::ErrorResponse;

/// Wrapper type for AppError to implement IntoResponse.
/// Neither the trait nor `AppError` is local to this crate.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        // Body-limit rejections surface here while the form is being read.
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return HttpAppError(AppError::PayloadTooLarge(err.body_text()));
        }
        HttpAppError(AppError::InvalidInput(format!(
            "Failed to read multipart: {}",
            err.body_text()
        )))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                details = %error.detailed_message(),
                error_type = error_type,
                "Error occurred"
            );
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

/// Build the JSON body for `error`, hiding details when they are sensitive
/// or when running in production.
pub fn error_body(error: &AppError, is_production: bool) -> ErrorResponse {
    let show_details = !is_production && !error.is_sensitive();
    ErrorResponse {
        error: error.client_message(),
        details: show_details.then(|| error.detailed_message()),
        error_type: show_details.then(|| error.error_type().to_string()),
        code: error.error_code().to_string(),
        recoverable: error.is_recoverable(),
        suggested_action: error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = error_body(app_error, is_production_env());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failed_body() {
        let err = AppError::upload_failed("Failed to upload file", anyhow::anyhow!("timeout"));
        let body = error_body(&err, false);

        assert_eq!(body.code, "UPLOAD_FAILED");
        assert!(body.recoverable);
        assert!(body.details.unwrap().contains("timeout"));
    }

    #[test]
    fn test_production_hides_details() {
        let err = AppError::InvalidInput("Empty file".to_string());
        let body = error_body(&err, true);

        assert_eq!(body.code, "INVALID_INPUT");
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
    }

    #[test]
    fn test_sensitive_errors_hide_details() {
        let err = AppError::Internal("db password leaked".to_string());
        let body = error_body(&err, false);

        assert!(body.details.is_none());
        assert!(!body.error.contains("password"));
    }

    #[test]
    fn test_payload_too_large_status() {
        let response = HttpAppError(AppError::PayloadTooLarge("big".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
