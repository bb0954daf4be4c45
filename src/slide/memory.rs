//! In-memory pyramid slide.
//!
//! `MemorySlide` keeps every level as a materialized premultiplied-ARGB
//! buffer. It backs the flat-image adapter and doubles as the standard test
//! slide: geometry behaves exactly like a decoder-backed slide, including
//! transparent fill for reads past the scanned area.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SlideError;

use super::reader::{RegionBuffer, SlideReader};

// =============================================================================
// Level Storage
// =============================================================================

/// One stored pyramid level: dimensions, exact downsample, and pixel data.
#[derive(Debug, Clone)]
pub struct MemoryLevel {
    /// Level width in its own pixel space
    pub width: u64,

    /// Level height in its own pixel space
    pub height: u64,

    /// Exact downsample factor relative to level 0
    pub downsample: f64,

    /// Premultiplied ARGB samples, row-major, `width * height` entries
    pub pixels: Vec<u32>,
}

// =============================================================================
// MemorySlide
// =============================================================================

/// A pyramidal slide held entirely in memory.
///
/// Construction validates the pyramid invariants once; afterwards the slide
/// is immutable and safe to share across worker tasks.
#[derive(Debug, Clone)]
pub struct MemorySlide {
    levels: Vec<MemoryLevel>,
    properties: HashMap<String, String>,
}

impl MemorySlide {
    /// Build a slide from pre-filled levels.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::InvalidPyramid`] if:
    /// - no levels are given
    /// - level 0's downsample is not 1.0
    /// - downsamples are not strictly increasing
    /// - any level's pixel count does not match its dimensions
    pub fn new(levels: Vec<MemoryLevel>) -> Result<Self, SlideError> {
        if levels.is_empty() {
            return Err(SlideError::InvalidPyramid("slide has no levels".into()));
        }
        if levels[0].downsample != 1.0 {
            return Err(SlideError::InvalidPyramid(format!(
                "level 0 downsample must be 1.0, got {}",
                levels[0].downsample
            )));
        }
        for (i, level) in levels.iter().enumerate() {
            if !level.downsample.is_finite() || level.downsample <= 0.0 {
                return Err(SlideError::InvalidPyramid(format!(
                    "level {i} has invalid downsample {}",
                    level.downsample
                )));
            }
            if i > 0 && level.downsample <= levels[i - 1].downsample {
                return Err(SlideError::InvalidPyramid(format!(
                    "downsamples must be strictly increasing (level {i}: {} after {})",
                    level.downsample,
                    levels[i - 1].downsample
                )));
            }
            if level.pixels.len() as u64 != level.width * level.height {
                return Err(SlideError::InvalidPyramid(format!(
                    "level {i} has {} samples for {}x{} pixels",
                    level.pixels.len(),
                    level.width,
                    level.height
                )));
            }
        }
        Ok(Self {
            levels,
            properties: HashMap::new(),
        })
    }

    /// Attach a metadata property (builder style).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    fn level(&self, level: usize) -> Result<&MemoryLevel, SlideError> {
        self.levels.get(level).ok_or(SlideError::InvalidLevel {
            level,
            level_count: self.levels.len(),
        })
    }
}

#[async_trait]
impl SlideReader for MemorySlide {
    fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn level_dimensions(&self, level: usize) -> Option<(u64, u64)> {
        self.levels.get(level).map(|l| (l.width, l.height))
    }

    fn level_downsample(&self, level: usize) -> Option<f64> {
        self.levels.get(level).map(|l| l.downsample)
    }

    fn best_level_for_downsample(&self, downsample: f64) -> usize {
        let mut best = 0;
        for (i, level) in self.levels.iter().enumerate() {
            if level.downsample <= downsample {
                best = i;
            } else {
                break;
            }
        }
        best
    }

    async fn read_region(
        &self,
        x: i64,
        y: i64,
        level: usize,
        width: u32,
        height: u32,
    ) -> Result<RegionBuffer, SlideError> {
        let stored = self.level(level)?;

        // Level-0 origin maps into this level's pixel space by the exact
        // downsample; anything outside the stored area stays transparent.
        let lx0 = (x as f64 / stored.downsample).floor() as i64;
        let ly0 = (y as f64 / stored.downsample).floor() as i64;

        let mut region = RegionBuffer::transparent(width, height);
        let out = region.pixels_mut();

        for row in 0..height as i64 {
            let ly = ly0 + row;
            if ly < 0 || ly as u64 >= stored.height {
                continue;
            }
            let src_row = ly as u64 * stored.width;
            let dst_row = row as usize * width as usize;
            for col in 0..width as i64 {
                let lx = lx0 + col;
                if lx < 0 || lx as u64 >= stored.width {
                    continue;
                }
                out[dst_row + col as usize] = stored.pixels[(src_row + lx as u64) as usize];
            }
        }

        Ok(region)
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
