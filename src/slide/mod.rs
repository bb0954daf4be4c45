//! Slide abstraction layer.
//!
//! This module owns the seam between the tiling pipeline and the slide
//! decoder:
//!
//! - [`SlideReader`]: format-agnostic trait the pipeline consumes
//! - [`RegionBuffer`]: premultiplied-ARGB pixel buffer handed across the seam
//! - [`MemorySlide`]: fully materialized in-memory pyramid
//! - [`open_image_slide`]: adapter that turns a flat raster image into a
//!   pyramid so the binary runs without a native decoder

mod image_source;
mod memory;
mod reader;

pub use image_source::{open_image_slide, pyramid_from_rgba, pyramid_level_count, PROP_SOURCE};
pub use memory::{MemoryLevel, MemorySlide};
pub use reader::{premultiply_argb, RegionBuffer, SlideReader};
