//! Pipeline driver.
//!
//! Iterates levels and tiles, invoking the per-tile stages in sequence:
//! plan → resolve → materialize → normalize → resample → write. The only
//! fatal condition is a slide that fails to open; every failure inside the
//! per-tile loop is caught at tile granularity, recorded in the run summary,
//! and does not affect sibling tiles. Reruns overwrite tiles in place, so
//! the whole pipeline is idempotent.
//!
//! Tiles are independent given the read-only slide handle, so the driver
//! fans them out across a bounded worker pool; CPU-heavy stages run on the
//! blocking pool. Write ordering carries no correctness requirement since
//! every tile has a unique path.

use std::path::Path;
use std::sync::Arc;

use image::Rgb;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, SlideError, TileError};
use crate::slide::SlideReader;
use crate::tile::{
    classify, resolve_region, unpremultiply, Opacity, TileEncoder, TileGrid, TileWriter,
    DEFAULT_BACKGROUND, DEFAULT_JPEG_QUALITY, DEFAULT_TILE_SIZE,
};

// =============================================================================
// Configuration
// =============================================================================

/// Fixed parameters of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Output tile edge length in pixels
    pub tile_size: u32,

    /// JPEG quality (1-100)
    pub quality: u8,

    /// Background color for fully transparent pixels
    pub background: Rgb<u8>,

    /// Maximum number of tiles in flight at once
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            quality: DEFAULT_JPEG_QUALITY,
            background: DEFAULT_BACKGROUND,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

// =============================================================================
// Run Summary
// =============================================================================

/// Why a tile was skipped. Skips are recorded, never retried; a rerun of
/// the whole pipeline is the recovery mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Resolved read dimensions were zero or negative
    EmptyRegion,

    /// Resolved read dimensions exceeded the safety ceiling
    RegionTooLarge,

    /// The decoder failed to materialize the region
    ReadFailed,

    /// JPEG encoding failed
    EncodeFailed,

    /// The tile file could not be written
    WriteFailed,
}

impl SkipReason {
    fn from_error(err: &TileError) -> Self {
        match err {
            TileError::EmptyRegion { .. } => SkipReason::EmptyRegion,
            TileError::RegionTooLarge { .. } => SkipReason::RegionTooLarge,
            TileError::Slide(_) => SkipReason::ReadFailed,
            TileError::Encode { .. } => SkipReason::EncodeFailed,
            TileError::Write { .. } => SkipReason::WriteFailed,
        }
    }
}

/// One skipped tile: coordinates plus the reason, as recorded by the driver.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTile {
    pub level: usize,
    pub tx: u32,
    pub ty: u32,
    pub reason: SkipReason,
    pub detail: String,
}

/// Per-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    pub level: usize,
    pub width: u64,
    pub height: u64,
    pub factor: u64,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub written: u64,
    pub skipped: u64,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tile_size: u32,
    pub quality: u8,
    pub levels: Vec<LevelSummary>,
    pub written: u64,
    pub skipped: u64,
    pub skipped_tiles: Vec<SkippedTile>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// The tiling pipeline driver.
pub struct TilePipeline {
    config: PipelineConfig,
}

impl TilePipeline {
    /// Create a driver with the given parameters.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The parameters in effect.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline: every level, every tile.
    ///
    /// The slide must already be open; it is shared read-only across
    /// workers. Returns the run summary, with skipped tiles sorted by
    /// `(level, ty, tx)` for deterministic reporting.
    ///
    /// # Errors
    ///
    /// Only fatal conditions surface here: a slide with no levels, an
    /// output root that cannot be created, or a panicked worker. Per-tile
    /// failures are recorded in the summary instead.
    pub async fn run<S>(&self, slide: Arc<S>, out_root: &Path) -> Result<RunSummary, PipelineError>
    where
        S: SlideReader + 'static,
    {
        let (width0, height0) = slide
            .dimensions()
            .ok_or_else(|| SlideError::InvalidPyramid("slide has no levels".into()))?;
        let level_count = slide.level_count();

        tokio::fs::create_dir_all(out_root)
            .await
            .map_err(|e| PipelineError::OutputDir {
                path: out_root.display().to_string(),
                message: e.to_string(),
            })?;

        let writer = Arc::new(TileWriter::new(out_root));
        let encoder = TileEncoder::new(self.config.tile_size, self.config.quality);
        let workers = self.config.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));

        info!(
            level_count,
            width0,
            height0,
            tile_size = self.config.tile_size,
            quality = encoder.quality(),
            workers,
            "starting tiling run"
        );

        let mut summary = RunSummary {
            tile_size: self.config.tile_size,
            quality: encoder.quality(),
            levels: Vec::with_capacity(level_count),
            written: 0,
            skipped: 0,
            skipped_tiles: Vec::new(),
        };

        for level in 0..level_count {
            let Some((level_width, level_height)) = slide.level_dimensions(level) else {
                warn!(level, "slide reported no dimensions for level, skipping");
                continue;
            };
            let grid = TileGrid::new(level, level_width, level_height, self.config.tile_size);

            info!(
                level,
                level_width,
                level_height,
                factor = grid.factor,
                tiles_x = grid.tiles_x,
                tiles_y = grid.tiles_y,
                "tiling level"
            );

            if let Err(e) = writer.ensure_level_dir(level).await {
                // Every write in this level will fail and be recorded per tile
                warn!(level, error = %e, "could not create level directory");
            }

            let mut level_summary = LevelSummary {
                level,
                width: level_width,
                height: level_height,
                factor: grid.factor,
                tiles_x: grid.tiles_x,
                tiles_y: grid.tiles_y,
                written: 0,
                skipped: 0,
            };

            let mut tasks: JoinSet<(u32, u32, Result<Opacity, TileError>)> = JoinSet::new();
            let background = self.config.background;

            for (tx, ty) in grid.coords() {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| PipelineError::Worker(e.to_string()))?;
                let slide = Arc::clone(&slide);
                let writer = Arc::clone(&writer);

                tasks.spawn(async move {
                    let result = process_tile(
                        slide.as_ref(),
                        &writer,
                        encoder,
                        background,
                        grid,
                        tx,
                        ty,
                        width0,
                        height0,
                    )
                    .await;
                    drop(permit);
                    (tx, ty, result)
                });

                // Keep the in-flight set bounded even on huge grids
                while tasks.len() > workers * 2 {
                    if let Some(joined) = tasks.join_next().await {
                        record_outcome(joined, level, &mut level_summary, &mut summary)?;
                    }
                }
            }

            while let Some(joined) = tasks.join_next().await {
                record_outcome(joined, level, &mut level_summary, &mut summary)?;
            }

            info!(
                level,
                written = level_summary.written,
                skipped = level_summary.skipped,
                "level complete"
            );
            summary.levels.push(level_summary);
        }

        summary
            .skipped_tiles
            .sort_by_key(|t| (t.level, t.ty, t.tx));

        info!(
            written = summary.written,
            skipped = summary.skipped,
            "tiling run complete"
        );
        Ok(summary)
    }
}

fn record_outcome(
    joined: Result<(u32, u32, Result<Opacity, TileError>), tokio::task::JoinError>,
    level: usize,
    level_summary: &mut LevelSummary,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    let (tx, ty, result) = joined.map_err(|e| PipelineError::Worker(e.to_string()))?;
    match result {
        Ok(opacity) => {
            level_summary.written += 1;
            summary.written += 1;
            if opacity != Opacity::Mixed {
                debug!(level, tx, ty, ?opacity, "tile written");
            }
        }
        Err(err) => {
            level_summary.skipped += 1;
            summary.skipped += 1;
            warn!(level, tx, ty, error = %err, "tile skipped");
            summary.skipped_tiles.push(SkippedTile {
                level,
                tx,
                ty,
                reason: SkipReason::from_error(&err),
                detail: err.to_string(),
            });
        }
    }
    Ok(())
}

/// The per-tile pipeline: resolve → materialize → normalize → resample →
/// encode → write.
#[allow(clippy::too_many_arguments)]
async fn process_tile<S: SlideReader + ?Sized>(
    slide: &S,
    writer: &TileWriter,
    encoder: TileEncoder,
    background: Rgb<u8>,
    grid: TileGrid,
    tx: u32,
    ty: u32,
    width0: u64,
    height0: u64,
) -> Result<Opacity, TileError> {
    let plan = grid.plan(tx, ty, width0, height0);
    let request = resolve_region(slide, &plan, grid.factor)?;

    let region = slide
        .read_region(
            request.x0,
            request.y0,
            request.source_level,
            request.read_w,
            request.read_h,
        )
        .await?;

    // Normalization, resampling and encoding are CPU-bound; keep them off
    // the async workers.
    let (data, opacity) = tokio::task::spawn_blocking(move || {
        let opacity = classify(region.pixels());
        let rgb = unpremultiply(&region, background);
        encoder.render(rgb).map(|data| (data, opacity))
    })
    .await
    .map_err(|e| TileError::Encode {
        message: format!("blocking task failed: {e}"),
    })??;

    writer.write(grid.level, tx, ty, &data).await?;
    Ok(opacity)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.quality, 90);
        assert_eq!(config.background, Rgb([255, 255, 255]));
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_skip_reason_mapping() {
        let err = TileError::EmptyRegion {
            read_w: 0,
            read_h: 5,
        };
        assert_eq!(SkipReason::from_error(&err), SkipReason::EmptyRegion);

        let err = TileError::Write {
            message: "disk full".into(),
        };
        assert_eq!(SkipReason::from_error(&err), SkipReason::WriteFailed);

        let err = TileError::Slide(SlideError::InvalidPyramid("x".into()));
        assert_eq!(SkipReason::from_error(&err), SkipReason::ReadFailed);
    }

    #[test]
    fn test_skip_reason_serializes_snake_case() {
        let json = serde_json::to_string(&SkipReason::RegionTooLarge).unwrap();
        assert_eq!(json, "\"region_too_large\"");
    }
}
