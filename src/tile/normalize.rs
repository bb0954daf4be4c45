//! Color normalization.
//!
//! Slide decoders hand out premultiplied ARGB. Before resampling, every
//! region is converted to straight-alpha opaque RGB:
//!
//! - alpha 0: the pixel was never scanned; it renders as the background
//!   color (white by default, so blank slide regions look like glass)
//! - alpha 255: channels are already straight, passed through unchanged
//! - otherwise: each channel is divided back out as `round(c * 255 / a)`,
//!   clamped to 255
//!
//! The divide uses exact integer arithmetic, so the same input buffer always
//! produces the same output bytes. Inputs are unsigned, so only an upper
//! clamp is needed.

use image::{Rgb, RgbImage};

use crate::slide::RegionBuffer;

/// Default background for fully transparent pixels.
pub const DEFAULT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

// =============================================================================
// Opacity Classification
// =============================================================================

/// Transparency profile of a region, used for fast paths and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opacity {
    /// Every pixel has alpha 255
    Opaque,

    /// Every pixel has alpha 0
    Transparent,

    /// Anything else
    Mixed,
}

/// Classify a whole buffer by its alpha channel.
pub fn classify(pixels: &[u32]) -> Opacity {
    let mut all_opaque = true;
    let mut all_transparent = true;
    for &px in pixels {
        match px >> 24 {
            255 => all_transparent = false,
            0 => all_opaque = false,
            _ => return Opacity::Mixed,
        }
        if !all_opaque && !all_transparent {
            return Opacity::Mixed;
        }
    }
    if all_opaque {
        Opacity::Opaque
    } else {
        Opacity::Transparent
    }
}

// =============================================================================
// Un-premultiplication
// =============================================================================

/// Convert a premultiplied ARGB region to an opaque RGB image.
///
/// Fully transparent and fully opaque regions take whole-buffer fast paths;
/// mixed regions divide per pixel.
pub fn unpremultiply(region: &RegionBuffer, background: Rgb<u8>) -> RgbImage {
    let (w, h) = (region.width(), region.height());
    let pixels = region.pixels();

    match classify(pixels) {
        Opacity::Transparent => RgbImage::from_pixel(w, h, background),
        Opacity::Opaque => {
            let mut out = RgbImage::new(w, h);
            for (dst, &px) in out.pixels_mut().zip(pixels) {
                *dst = Rgb([
                    ((px >> 16) & 0xFF) as u8,
                    ((px >> 8) & 0xFF) as u8,
                    (px & 0xFF) as u8,
                ]);
            }
            out
        }
        Opacity::Mixed => {
            let mut out = RgbImage::new(w, h);
            for (dst, &px) in out.pixels_mut().zip(pixels) {
                *dst = unpremultiply_pixel(px, background);
            }
            out
        }
    }
}

/// Un-premultiply a single ARGB sample.
pub fn unpremultiply_pixel(px: u32, background: Rgb<u8>) -> Rgb<u8> {
    let a = px >> 24;
    let r = (px >> 16) & 0xFF;
    let g = (px >> 8) & 0xFF;
    let b = px & 0xFF;

    match a {
        0 => background,
        255 => Rgb([r as u8, g as u8, b as u8]),
        _ => {
            // round(c * 255 / a) in integers; result is never negative
            let div = |c: u32| ((c * 255 + a / 2) / a).min(255) as u8;
            Rgb([div(r), div(g), div(b)])
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
