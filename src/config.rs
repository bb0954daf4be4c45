//! Command-line configuration.
//!
//! Three subcommands:
//! - `generate` - tile a slide into a directory tree
//! - `info` - print slide metadata as JSON
//! - `prune` - remove stray files from an existing tile tree
//!
//! All options can also be set via environment variables with the `TILER_`
//! prefix (e.g. `TILER_QUALITY=85`).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use image::Rgb;

use crate::tile::{is_valid_quality, DEFAULT_JPEG_QUALITY, DEFAULT_TILE_SIZE};

/// Largest accepted tile edge; tiles beyond this stop being "tiles".
pub const MAX_TILE_SIZE: u32 = 4096;

// =============================================================================
// CLI
// =============================================================================

/// wsi-tiler - convert pyramidal Whole Slide Images into tile trees.
///
/// Reads a slide, plans a tile grid per pyramid level, and writes one
/// JPEG per tile under `<output>/level<n>/<tx>_<ty>.jpg`, ready for
/// tile-based viewers.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-tiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate the tile pyramid for a slide.
    Generate(GenerateConfig),

    /// Print slide metadata as JSON.
    Info(InfoConfig),

    /// Remove files that are not well-named tiles from a tile tree.
    Prune(PruneConfig),
}

// =============================================================================
// Generate
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct GenerateConfig {
    /// Path to the source slide image.
    pub slide: PathBuf,

    /// Root directory for the tile tree.
    #[arg(short, long, default_value = "tiles", env = "TILER_OUTPUT")]
    pub output: PathBuf,

    /// Output tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// JPEG quality for tile encoding (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "TILER_QUALITY")]
    pub quality: u8,

    /// Background color for unscanned regions, as RRGGBB hex.
    #[arg(long, default_value = "ffffff", env = "TILER_BACKGROUND")]
    pub background: String,

    /// Number of concurrent tile workers (0 = number of CPUs).
    #[arg(long, default_value_t = 0, env = "TILER_WORKERS")]
    pub workers: usize,

    /// Write a JSON run report to this path after the run.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl GenerateConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(format!(
                "tile_size must be between 1 and {MAX_TILE_SIZE}, got {}",
                self.tile_size
            ));
        }
        if !is_valid_quality(self.quality) {
            return Err(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            ));
        }
        parse_background(&self.background)?;
        Ok(())
    }

    /// The background color as parsed RGB (call `validate()` first).
    pub fn background_rgb(&self) -> Rgb<u8> {
        parse_background(&self.background).unwrap_or(Rgb([255, 255, 255]))
    }

    /// Worker count with 0 resolved to the machine's parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Parse an `RRGGBB` hex color, with or without a leading `#`.
pub fn parse_background(s: &str) -> Result<Rgb<u8>, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("background must be RRGGBB hex, got '{s}'"));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

// =============================================================================
// Info
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// Path to the slide image.
    pub slide: PathBuf,

    /// Tile size used when deriving the pyramid depth.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Prune
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PruneConfig {
    /// Root of the tile tree to prune.
    #[arg(default_value = "tiles")]
    pub root: PathBuf,

    /// Report what would be removed without deleting anything.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
