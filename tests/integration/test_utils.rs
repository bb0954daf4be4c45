//! Test utilities for integration tests.
//!
//! Provides in-memory test slides and helpers for inspecting generated
//! tile trees.

use std::path::Path;

use async_trait::async_trait;

use wsi_tiler::error::SlideError;
use wsi_tiler::slide::{premultiply_argb, MemoryLevel, MemorySlide, RegionBuffer, SlideReader};

/// Pack an opaque color as a premultiplied ARGB sample.
pub fn opaque(r: u8, g: u8, b: u8) -> u32 {
    premultiply_argb(r, g, b, 255)
}

/// An opaque level filled with a position-dependent pattern, so resampled
/// tiles carry recognizable content.
pub fn patterned_level(width: u64, height: u64, downsample: f64) -> MemoryLevel {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| opaque((x % 251) as u8, (y % 241) as u8, 60)))
        .collect();
    MemoryLevel {
        width,
        height,
        downsample,
        pixels,
    }
}

/// A fully transparent level (alpha 0 everywhere).
pub fn transparent_level(width: u64, height: u64, downsample: f64) -> MemoryLevel {
    MemoryLevel {
        width,
        height,
        downsample,
        pixels: vec![0u32; (width * height) as usize],
    }
}

/// The canonical two-level test slide: level 0 is 600x600, level 1 is
/// 300x300 at downsample 2.
pub fn slide_600() -> MemorySlide {
    MemorySlide::new(vec![
        patterned_level(600, 600, 1.0),
        patterned_level(300, 300, 2.0),
    ])
    .unwrap()
}

/// Same geometry as [`slide_600`] but fully transparent.
pub fn transparent_slide_600() -> MemorySlide {
    MemorySlide::new(vec![
        transparent_level(600, 600, 1.0),
        transparent_level(300, 300, 2.0),
    ])
    .unwrap()
}

// =============================================================================
// Failing Slide
// =============================================================================

/// A slide whose metadata is healthy but whose decoder fails every region
/// read. Exercises per-tile error isolation.
pub struct FailingSlide {
    pub width: u64,
    pub height: u64,
}

#[async_trait]
impl SlideReader for FailingSlide {
    fn level_count(&self) -> usize {
        1
    }

    fn level_dimensions(&self, level: usize) -> Option<(u64, u64)> {
        (level == 0).then_some((self.width, self.height))
    }

    fn level_downsample(&self, level: usize) -> Option<f64> {
        (level == 0).then_some(1.0)
    }

    fn best_level_for_downsample(&self, _downsample: f64) -> usize {
        0
    }

    async fn read_region(
        &self,
        x: i64,
        y: i64,
        level: usize,
        width: u32,
        height: u32,
    ) -> Result<RegionBuffer, SlideError> {
        Err(SlideError::Read {
            level,
            x,
            y,
            width,
            height,
            reason: "synthetic decoder failure".to_string(),
        })
    }

    fn property(&self, _name: &str) -> Option<String> {
        None
    }
}

// =============================================================================
// Tile Tree Inspection
// =============================================================================

/// Sorted list of file names in a level directory.
pub fn tile_names(level_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(level_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Decode a tile file and return its pixel dimensions.
pub fn tile_dimensions(path: &Path) -> (u32, u32) {
    let img = image::open(path).unwrap();
    (img.width(), img.height())
}
