//! API constants

/// Versioned prefix of the media routes
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field names of the upload form
pub const FIELD_FILE: &str = "file";
pub const FIELD_FOLDER: &str = "folder";
pub const FIELD_TARGET_HEIGHT: &str = "target_height";
pub const FIELD_QUALITY: &str = "quality";

/// Fallback when the multipart part carries no content type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
