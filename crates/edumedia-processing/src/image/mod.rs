//! Image processing module
//!
//! - Bounding-box resize math and filter selection (resize)
//! - Decode and lossy re-encode with mozjpeg or libwebp (transcoder)

pub mod resize;
pub mod transcoder;

pub use resize::ImageResize;
pub use transcoder::{ImageTranscoder, TranscodeError, TranscodedImage};
