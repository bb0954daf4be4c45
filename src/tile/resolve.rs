//! Source region resolution.
//!
//! Maps a tile's level-0 rectangle plus its output downsample factor to a
//! concrete read request against the slide: which stored level to read and
//! how many of that level's pixels to ask for. Requests with degenerate or
//! oversized geometry are rejected outright, never clamped; the driver logs
//! and skips the tile.

use crate::error::TileError;
use crate::slide::SlideReader;

use super::grid::TilePlan;

/// Safety ceiling on `read_w * read_h` for a single materialization.
///
/// Bounds the worst-case per-tile allocation against corrupt or adversarial
/// level metadata; at 4 bytes per sample this caps a region at 400 MB.
pub const MAX_REGION_PIXELS: u64 = 100_000_000;

// =============================================================================
// Read Request
// =============================================================================

/// A validated region read against a stored slide level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadRequest {
    /// Region origin in level-0 pixel space
    pub x0: i64,

    /// Region origin in level-0 pixel space
    pub y0: i64,

    /// Stored level to read from
    pub source_level: usize,

    /// Exact native downsample of `source_level`
    pub source_downsample: f64,

    /// Region width in `source_level` pixels: `ceil(tile_w / source_downsample)`
    pub read_w: u32,

    /// Region height in `source_level` pixels: `ceil(tile_h / source_downsample)`
    pub read_h: u32,
}

impl ReadRequest {
    /// Total number of samples the request will materialize.
    pub fn pixel_count(&self) -> u64 {
        self.read_w as u64 * self.read_h as u64
    }
}

/// Resolve a tile plan to a read request against the best stored level.
///
/// The chosen source level is the finest stored level whose native
/// downsample does not exceed the output factor, so tiles are always built
/// from equal-or-finer data and only ever scaled down or kept as-is, never
/// sourced from a coarser level.
///
/// # Errors
///
/// - [`TileError::EmptyRegion`] if either read dimension resolves to <= 0
/// - [`TileError::RegionTooLarge`] if the region exceeds [`MAX_REGION_PIXELS`]
/// - [`TileError::Slide`] if the slide reports no downsample for the level
///   it itself nominated
pub fn resolve_region<S: SlideReader + ?Sized>(
    slide: &S,
    plan: &TilePlan,
    factor: u64,
) -> Result<ReadRequest, TileError> {
    let source_level = slide.best_level_for_downsample(factor as f64);
    let source_downsample = slide.level_downsample(source_level).ok_or_else(|| {
        TileError::Slide(crate::error::SlideError::InvalidLevel {
            level: source_level,
            level_count: slide.level_count(),
        })
    })?;

    let (read_w, read_h) = if source_downsample.is_finite() && source_downsample > 0.0 {
        (
            (plan.tile_w as f64 / source_downsample).ceil() as i64,
            (plan.tile_h as f64 / source_downsample).ceil() as i64,
        )
    } else {
        (0, 0)
    };

    if read_w <= 0 || read_h <= 0 {
        return Err(TileError::EmptyRegion { read_w, read_h });
    }

    let pixels = read_w as u64 * read_h as u64;
    if pixels > MAX_REGION_PIXELS {
        return Err(TileError::RegionTooLarge {
            read_w: read_w.min(u32::MAX as i64) as u32,
            read_h: read_h.min(u32::MAX as i64) as u32,
            pixels,
            ceiling: MAX_REGION_PIXELS,
        });
    }

    Ok(ReadRequest {
        x0: plan.x0,
        y0: plan.y0,
        source_level,
        source_downsample,
        read_w: read_w as u32,
        read_h: read_h as u32,
    })
}

// =============================================================================
// Tests
// =============================================================================
