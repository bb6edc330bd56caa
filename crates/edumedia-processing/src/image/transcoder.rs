//! Decode, bound, and re-encode images before upload.

use std::io::Cursor;

use bytes::Bytes;
use edumedia_core::constants::OUTPUT_DPI;
use edumedia_core::{ImageConstraints, OutputFormat};
use image::{DynamicImage, GenericImageView, ImageReader};

use super::resize::ImageResize;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid image constraints: {0}")]
    InvalidConstraints(String),

    #[error("Transcode task failed: {0}")]
    Task(String),
}

/// Output of one transcode
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    /// Size of the input in bytes
    pub original_size: u64,
    pub format: OutputFormat,
}

impl TranscodedImage {
    /// Fraction of the input size saved, `(original - new) / original`.
    /// Negative when the output grew.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.original_size as f64 - self.data.len() as f64) / self.original_size as f64
    }
}

pub struct ImageTranscoder;

impl ImageTranscoder {
    /// Decode `data`, shrink it into the constraint box if needed, and
    /// re-encode with the configured lossy format.
    ///
    /// Always re-encodes, even when no resize is needed. CPU-bound; use
    /// [`ImageTranscoder::transcode_async`] from async code.
    pub fn transcode(
        data: &[u8],
        constraints: &ImageConstraints,
    ) -> Result<TranscodedImage, TranscodeError> {
        constraints
            .validate()
            .map_err(|e| TranscodeError::InvalidConstraints(e.to_string()))?;

        let img = Self::decode(data)?;
        let (width, height) = img.dimensions();
        let (target_w, target_h) = ImageResize::fit_within(
            width,
            height,
            constraints.max_width,
            constraints.max_height,
        );

        let img = if (target_w, target_h) != (width, height) {
            let filter = ImageResize::select_filter(width, height, target_w, target_h);
            tracing::debug!(
                from_width = width,
                from_height = height,
                to_width = target_w,
                to_height = target_h,
                filter = ?filter,
                "Resizing image"
            );
            img.resize_exact(target_w, target_h, filter)
        } else {
            img
        };

        let encoded = match constraints.format {
            OutputFormat::Jpeg => Self::encode_jpeg(&img, constraints.quality)?,
            OutputFormat::WebP => Self::encode_webp(&img, constraints.quality)?,
        };

        let (out_w, out_h) = img.dimensions();
        Ok(TranscodedImage {
            data: encoded,
            width: out_w,
            height: out_h,
            original_size: data.len() as u64,
            format: constraints.format,
        })
    }

    /// Run [`ImageTranscoder::transcode`] on the blocking thread pool.
    pub async fn transcode_async(
        data: Bytes,
        constraints: ImageConstraints,
    ) -> Result<TranscodedImage, TranscodeError> {
        tokio::task::spawn_blocking(move || Self::transcode(&data, &constraints))
            .await
            .map_err(|e| TranscodeError::Task(e.to_string()))?
    }

    /// Decode with pixel-count and allocation limits lifted.
    fn decode(data: &[u8]) -> Result<DynamicImage, TranscodeError> {
        let mut reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;
        // `image` always decodes the full frame into memory and offers no
        // sequential or scanline mode, so peak memory is the decoded bitmap;
        // only the resize that follows brings it back down.
        reader.no_limits();

        if reader.format().is_none() {
            return Err(TranscodeError::Decode("Unrecognized image format".to_string()));
        }

        reader
            .decode()
            .map_err(|e| TranscodeError::Decode(e.to_string()))
    }

    /// Progressive JPEG with optimized Huffman tables and a 72 DPI JFIF header.
    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, TranscodeError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_pixel_density(mozjpeg::PixelDensity {
            unit: mozjpeg::PixelDensityUnit::Inches,
            x: OUTPUT_DPI,
            y: OUTPUT_DPI,
        });

        let mut comp = comp
            .start_compress(Vec::new())
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        comp.write_scanlines(&rgb_img)
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        let jpeg_data = comp
            .finish()
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;

        Ok(Bytes::from(jpeg_data))
    }

    fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Bytes, TranscodeError> {
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality as f32);

        if webp_data.is_empty() {
            return Err(TranscodeError::Encode("WebP encoder produced no output".to_string()));
        }

        Ok(Bytes::copy_from_slice(&webp_data))
    }
}
