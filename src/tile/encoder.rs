//! Tile resampling and JPEG encoding.
//!
//! The encoder is the last in-memory stage of the pipeline: it scales a
//! normalized source region to the canonical tile size with a Lanczos
//! kernel (whether scaling up or down) and encodes the result as JPEG at a
//! fixed quality.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};

use crate::error::TileError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Tile Encoder
// =============================================================================

/// Resamples normalized regions to the tile size and encodes them as JPEG.
///
/// Stateless apart from its two fixed parameters, so it is `Copy` and can be
/// handed to every worker.
#[derive(Debug, Clone, Copy)]
pub struct TileEncoder {
    tile_size: u32,
    quality: u8,
}

impl TileEncoder {
    /// Create an encoder for the given tile size and quality.
    ///
    /// Quality is clamped to the valid range.
    pub fn new(tile_size: u32, quality: u8) -> Self {
        Self {
            tile_size,
            quality: clamp_quality(quality),
        }
    }

    /// The canonical tile edge length.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// The JPEG quality in effect.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Scale a region to exactly `tile_size x tile_size`.
    ///
    /// Uses Lanczos3 in both directions; a region already at the tile size
    /// is returned unchanged.
    pub fn resample(&self, img: RgbImage) -> RgbImage {
        if img.width() == self.tile_size && img.height() == self.tile_size {
            return img;
        }
        imageops::resize(
            &img,
            self.tile_size,
            self.tile_size,
            imageops::FilterType::Lanczos3,
        )
    }

    /// Encode an image as JPEG at the configured quality.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Encode`] if the JPEG encoder fails.
    pub fn encode(&self, img: &RgbImage) -> Result<Bytes, TileError> {
        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);
        encoder
            .encode_image(img)
            .map_err(|e| TileError::Encode {
                message: e.to_string(),
            })?;
        Ok(Bytes::from(output))
    }

    /// Resample and encode in one step: the full in-memory tail of the
    /// per-tile pipeline.
    pub fn render(&self, img: RgbImage) -> Result<Bytes, TileError> {
        self.encode(&self.resample(img))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    quality >= MIN_JPEG_QUALITY && quality <= MAX_JPEG_QUALITY
}

/// Clamp quality to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
