//! # WSI Tiler
//!
//! Converts a pyramidal Whole Slide Image into a directory tree of
//! fixed-size JPEG tiles, one subtree per pyramid level, suitable for
//! tile-based viewers.
//!
//! Slides are tens of gigapixels, so the pipeline never materializes a
//! level: it plans a tile grid per level, reads each tile's source region
//! from the best stored resolution, removes premultiplied alpha, resamples
//! to the canonical tile size, and writes the JPEG to a deterministic path.
//! A failed tile is skipped and recorded; only a slide that fails to open
//! aborts a run.
//!
//! ## Architecture
//!
//! - [`slide`] - decoder seam: the [`SlideReader`] trait, in-memory
//!   pyramids, and the flat-image adapter
//! - [`tile`] - per-tile stages: grid planning, region resolution, color
//!   normalization, resampling/encoding, persistence, pruning
//! - [`pipeline`] - the driver that walks levels and tiles with a bounded
//!   worker pool
//! - [`config`] - CLI and configuration types
//! - [`error`] - error taxonomy (fatal vs per-tile)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use wsi_tiler::{open_image_slide, PipelineConfig, TilePipeline};
//!
//! #[tokio::main]
//! async fn main() {
//!     let slide = open_image_slide(Path::new("slide.png"), 256).expect("open slide");
//!     let pipeline = TilePipeline::new(PipelineConfig::default());
//!     let summary = pipeline
//!         .run(Arc::new(slide), Path::new("tiles"))
//!         .await
//!         .expect("run pipeline");
//!     println!("{} tiles written, {} skipped", summary.written, summary.skipped);
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod slide;
pub mod tile;

// Re-export commonly used types
pub use config::{parse_background, Cli, Command, GenerateConfig, InfoConfig, PruneConfig};
pub use error::{PipelineError, SlideError, TileError};
pub use pipeline::{
    LevelSummary, PipelineConfig, RunSummary, SkipReason, SkippedTile, TilePipeline,
};
pub use slide::{
    open_image_slide, premultiply_argb, pyramid_from_rgba, pyramid_level_count, MemoryLevel,
    MemorySlide, RegionBuffer, SlideReader,
};
pub use tile::{
    classify, clamp_quality, is_valid_quality, level_factor, parse_tile_name, prune_level_dir,
    prune_tile_tree, resolve_region, unpremultiply, Opacity, PruneReport, ReadRequest, TileEncoder,
    TileGrid, TilePlan, TileWriter, DEFAULT_JPEG_QUALITY, DEFAULT_TILE_SIZE, MAX_REGION_PIXELS,
    TILE_EXTENSION,
};
