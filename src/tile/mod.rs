//! Per-tile pipeline stages.
//!
//! Each tile flows through these stages in order:
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌────────────┐   ┌─────────────┐
//! │ TileGrid  │──▶│ ReadRequest  │──▶│ normalize  │──▶│ TileEncoder │
//! │ (plan)    │   │ (resolve)    │   │ (ARGB→RGB) │   │ (Lanczos +  │
//! └───────────┘   └──────────────┘   └────────────┘   │  JPEG)      │
//!                                                     └──────┬──────┘
//!                                                            ▼
//!                                                     ┌─────────────┐
//!                                                     │ TileWriter  │
//!                                                     └─────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileGrid`] / [`TilePlan`]: tile enumeration and level-0 rectangles
//! - [`resolve_region`] / [`ReadRequest`]: source level selection and
//!   geometry validation against [`MAX_REGION_PIXELS`]
//! - [`unpremultiply`] / [`Opacity`]: premultiplied-alpha removal
//! - [`TileEncoder`]: Lanczos resample to the tile size + JPEG encode
//! - [`TileWriter`]: deterministic `level<n>/<tx>_<ty>.jpg` layout
//! - [`prune_tile_tree`]: maintenance pass removing stray files

mod encoder;
mod grid;
mod normalize;
mod prune;
mod resolve;
mod writer;

pub use encoder::{
    clamp_quality, is_valid_quality, TileEncoder, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};
pub use grid::{level_factor, TileGrid, TilePlan, DEFAULT_TILE_SIZE};
pub use normalize::{classify, unpremultiply, unpremultiply_pixel, Opacity, DEFAULT_BACKGROUND};
pub use prune::{prune_level_dir, prune_tile_tree, PruneReport};
pub use resolve::{resolve_region, ReadRequest, MAX_REGION_PIXELS};
pub use writer::{parse_tile_name, TileWriter, TILE_EXTENSION};
