//! Flat-image slide adapter.
//!
//! Opens an ordinary raster image (PNG, JPEG, TIFF) and synthesizes a
//! power-of-two pyramid from it, so the tiler runs end-to-end without a
//! native slide decoder. Level 0 is the image itself; each further level
//! halves the longest edge until it fits inside a single tile.
//!
//! This is an adapter, not a slide format parser: real pyramidal formats
//! plug in behind [`crate::slide::SlideReader`] instead.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};

use crate::error::SlideError;

use super::memory::{MemoryLevel, MemorySlide};

/// Property name under which the adapter records the source file path.
pub const PROP_SOURCE: &str = "tiler.source";

/// Number of pyramid levels for an image, halving until the longest edge
/// fits in one tile.
pub fn pyramid_level_count(width: u64, height: u64, tile_size: u32) -> usize {
    let mut max_dim = width.max(height).max(1);
    let mut count = 1;
    while max_dim > tile_size as u64 {
        max_dim = max_dim.div_ceil(2);
        count += 1;
    }
    count
}

/// Build an in-memory pyramid from a straight-alpha RGBA image.
///
/// Channels are premultiplied before downsampling so that partially
/// transparent edges resample without color bleed, and stored premultiplied
/// as a decoder would hand them out.
pub fn pyramid_from_rgba(img: &RgbaImage, tile_size: u32) -> Result<MemorySlide, SlideError> {
    let (w0, h0) = (img.width() as u64, img.height() as u64);
    if w0 == 0 || h0 == 0 {
        return Err(SlideError::InvalidPyramid("image has zero extent".into()));
    }

    let base = premultiply_image(img);
    let count = pyramid_level_count(w0, h0, tile_size);

    let mut levels = Vec::with_capacity(count);
    let mut current = base;
    for i in 0..count {
        if i > 0 {
            let lw = w0.div_ceil(1 << i).max(1) as u32;
            let lh = h0.div_ceil(1 << i).max(1) as u32;
            current = imageops::resize(&current, lw, lh, imageops::FilterType::Lanczos3);
        }
        levels.push(MemoryLevel {
            width: current.width() as u64,
            height: current.height() as u64,
            downsample: (1u64 << i) as f64,
            pixels: pack_argb(&current),
        });
    }

    MemorySlide::new(levels)
}

/// Open a raster image file as a pyramidal slide.
///
/// # Errors
///
/// Returns [`SlideError::Open`] if the file is missing or not a decodable
/// image.
pub fn open_image_slide(path: &Path, tile_size: u32) -> Result<MemorySlide, SlideError> {
    let img = image::open(path).map_err(|e| SlideError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let slide = pyramid_from_rgba(&img.to_rgba8(), tile_size)?;
    Ok(slide.with_property(PROP_SOURCE, path.display().to_string()))
}

fn premultiply_image(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for Rgba([r, g, b, a]) in out.pixels_mut() {
        let alpha = *a as u32;
        if alpha < 255 {
            *r = ((*r as u32 * alpha + 127) / 255) as u8;
            *g = ((*g as u32 * alpha + 127) / 255) as u8;
            *b = ((*b as u32 * alpha + 127) / 255) as u8;
        }
    }
    out
}

fn pack_argb(img: &RgbaImage) -> Vec<u32> {
    img.pixels()
        .map(|Rgba([r, g, b, a])| {
            ((*a as u32) << 24) | ((*r as u32) << 16) | ((*g as u32) << 8) | (*b as u32)
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
