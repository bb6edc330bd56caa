use std::str::FromStr;

use crate::constants::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_TRANSCODE_QUALITY};
use crate::error::AppError;

/// Lossy output format used when transcoding images before upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

/// Bounding box and encoder settings for the image transcoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConstraints {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality, 1-100
    pub quality: u8,
    pub format: OutputFormat,
}

impl Default for ImageConstraints {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_TRANSCODE_QUALITY,
            format: OutputFormat::Jpeg,
        }
    }
}

impl ImageConstraints {
    /// Bounds derived from a caller-supplied target height.
    ///
    /// Width is twice the height (a fixed 2:1 box); quality and format are
    /// kept from `self`.
    pub fn for_target_height(&self, target_height: u32) -> Self {
        Self {
            max_width: target_height.saturating_mul(2),
            max_height: target_height,
            ..*self
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(AppError::InvalidInput(format!(
                "Image bounds must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(AppError::InvalidInput(format!(
                "Image quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}
