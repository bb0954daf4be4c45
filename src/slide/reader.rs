//! SlideReader trait for format-agnostic slide access.
//!
//! This module defines the `SlideReader` trait, the seam between the tiling
//! pipeline and whatever decoder actually understands the slide file. The
//! pipeline only ever talks to this trait: it queries pyramid geometry,
//! selects a source level, and materializes premultiplied-ARGB regions.
//!
//! Implementations in this crate:
//! - [`crate::slide::MemorySlide`] holds a fully materialized pyramid in
//!   memory (used by tests and by the flat-image adapter).

use async_trait::async_trait;

use crate::error::SlideError;

// =============================================================================
// Region Buffer
// =============================================================================

/// A rectangular buffer of premultiplied ARGB samples.
///
/// Each sample is a packed `u32`: alpha in the top byte, then red, green,
/// blue. Color channels are premultiplied by alpha, which is the convention
/// slide decoders use for regions that extend past the scanned area.
///
/// A buffer is produced once per tile request and consumed exactly once by
/// the color normalizer; it never outlives its tile's pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl RegionBuffer {
    /// Create a buffer from raw samples.
    ///
    /// Returns `None` if the sample count does not match `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if pixels.len() as u64 != width as u64 * height as u64 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a fully transparent buffer of the given size.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u32; width as usize * height as usize],
        }
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw premultiplied ARGB samples, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable access to the samples, for implementations filling the buffer.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }
}

/// Pack straight (non-premultiplied) RGBA channels into a premultiplied
/// ARGB sample.
pub fn premultiply_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    let mul = |c: u8| -> u32 { (c as u32 * a as u32 + 127) / 255 };
    ((a as u32) << 24) | (mul(r) << 16) | (mul(g) << 8) | mul(b)
}

// =============================================================================
// SlideReader Trait
// =============================================================================

/// Format-agnostic interface to an opened pyramidal slide.
///
/// Level 0 is always full resolution; higher levels are progressively
/// coarser. The handle is read-only after open: implementations must support
/// concurrent region reads from multiple workers.
///
/// Coordinates passed to [`read_region`](SlideReader::read_region) are
/// expressed in level-0 pixel space regardless of the level being read,
/// matching the convention of common slide decoders.
#[async_trait]
pub trait SlideReader: Send + Sync {
    /// Number of pyramid levels (>= 1 for a valid slide).
    fn level_count(&self) -> usize;

    /// Dimensions of the full-resolution (level 0) image.
    ///
    /// Returns `(width, height)` in pixels, or `None` if no levels exist.
    fn dimensions(&self) -> Option<(u64, u64)> {
        self.level_dimensions(0)
    }

    /// Dimensions of a specific level, or `None` if out of range.
    fn level_dimensions(&self, level: usize) -> Option<(u64, u64)>;

    /// Exact downsample factor of a level relative to level 0.
    ///
    /// Level 0 always has downsample 1.0. Returns `None` if out of range.
    fn level_downsample(&self, level: usize) -> Option<f64>;

    /// Find the best stored level for a requested downsample factor.
    ///
    /// Returns the level with the largest native downsample that does not
    /// exceed `downsample`, so the pipeline never reads coarser data than
    /// the output level needs. Falls back to level 0 when every stored
    /// level is coarser than the request.
    fn best_level_for_downsample(&self, downsample: f64) -> usize;

    /// Materialize a region of the slide as premultiplied ARGB.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - origin of the region in level-0 pixel space
    /// * `level` - pyramid level to read from
    /// * `width`, `height` - region extent in `level`'s own pixel space
    ///
    /// Pixels outside the slide's scanned area come back fully transparent.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range level or a decoder failure.
    async fn read_region(
        &self,
        x: i64,
        y: i64,
        level: usize,
        width: u32,
        height: u32,
    ) -> Result<RegionBuffer, SlideError>;

    /// Look up a named metadata property (e.g. `mpp-x`), if present.
    fn property(&self, name: &str) -> Option<String>;
}

// =============================================================================
// Tests
// =============================================================================
