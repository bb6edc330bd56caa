//! Default values for the upload pipeline.
//!
//! These are defaults only. Runtime values come from [`crate::UploadSettings`],
//! which reads environment overrides.

/// Retries after the first failed remote write (4 attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Images above this size are always transcoded before upload.
pub const LARGE_IMAGE_THRESHOLD_BYTES: u64 = 5 * 1024 * 1024;
/// General optimization threshold; images above it are transcoded too.
pub const OPTIMIZE_THRESHOLD_BYTES: u64 = 1024 * 1024;

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_TRANSCODE_QUALITY: u8 = 85;

/// Delivery quality requested from the remote service when the caller gives none.
pub const DEFAULT_DELIVERY_QUALITY: &str = "auto:good";

/// Pixel density written into transcoded JPEG headers.
pub const OUTPUT_DPI: u16 = 72;

pub const CHAT_IMAGES_FOLDER: &str = "chat-images";
pub const COURSE_FOLDER_MARKER: &str = "course";
pub const COURSE_VARIANT_WIDTHS: [u32; 3] = [1024, 768, 480];

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 100 * 1024 * 1024;
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_CLOUDINARY_DELIVERY_HOST: &str = "res.cloudinary.com";
pub const DEFAULT_CLOUDINARY_TIMEOUT_SECS: u64 = 120;
