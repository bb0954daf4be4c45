//! wsi-tiler - convert pyramidal Whole Slide Images into tile trees.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_tiler::{
    config::{Cli, Command, GenerateConfig, InfoConfig, PruneConfig},
    pipeline::{PipelineConfig, TilePipeline},
    slide::{open_image_slide, SlideReader},
    tile::{level_factor, prune_tile_tree, TileGrid},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(config) => run_generate(config).await,
        Command::Info(config) => run_info(config),
        Command::Prune(config) => run_prune(config).await,
    }
}

// =============================================================================
// Generate Command
// =============================================================================

async fn run_generate(config: GenerateConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Slide: {}", config.slide.display());
    info!("Output: {}", config.output.display());
    info!(
        "Tile size: {}px, JPEG quality: {}, workers: {}",
        config.tile_size,
        config.quality,
        config.effective_workers()
    );

    // Opening the slide is the only fatal step; nothing is written if it
    // fails.
    let slide = match open_image_slide(&config.slide, config.tile_size) {
        Ok(slide) => slide,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = TilePipeline::new(PipelineConfig {
        tile_size: config.tile_size,
        quality: config.quality,
        background: config.background_rgb(),
        workers: config.effective_workers(),
    });

    let summary = match pipeline.run(Arc::new(slide), &config.output).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if summary.skipped > 0 {
        warn!(
            "{} tile(s) skipped; rerun the pipeline after fixing the cause",
            summary.skipped
        );
    }

    if let Some(ref report_path) = config.report {
        let json = match serde_json::to_string_pretty(&summary) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = std::fs::write(report_path, json) {
            error!("Failed to write report {}: {}", report_path.display(), e);
            return ExitCode::FAILURE;
        }
        info!("Report written to {}", report_path.display());
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(config: InfoConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    let slide = match open_image_slide(&config.slide, config.tile_size) {
        Ok(slide) => slide,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (width0, height0) = slide.dimensions().unwrap_or((0, 0));

    let levels: Vec<_> = (0..slide.level_count())
        .map(|level| {
            let (width, height) = slide.level_dimensions(level).unwrap_or((0, 0));
            let grid = TileGrid::new(level, width, height, config.tile_size);
            serde_json::json!({
                "level": level,
                "width": width,
                "height": height,
                "downsample": slide.level_downsample(level),
                "factor": level_factor(level),
                "tiles_x": grid.tiles_x,
                "tiles_y": grid.tiles_y,
            })
        })
        .collect();

    // Physical extent when the slide carries micrometers-per-pixel metadata
    let micrometers = match (
        slide.property("mpp-x").and_then(|v| v.parse::<f64>().ok()),
        slide.property("mpp-y").and_then(|v| v.parse::<f64>().ok()),
    ) {
        (Some(mpp_x), Some(mpp_y)) => Some(serde_json::json!({
            "width": mpp_x * width0 as f64,
            "height": mpp_y * height0 as f64,
        })),
        _ => None,
    };

    let report = serde_json::json!({
        "source": config.slide.display().to_string(),
        "level_count": slide.level_count(),
        "width": width0,
        "height": height0,
        "micrometers": micrometers,
        "vendor": slide.property("vendor"),
        "tile_size": config.tile_size,
        "levels": levels,
    });

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Prune Command
// =============================================================================

async fn run_prune(config: PruneConfig) -> ExitCode {
    init_logging(config.verbose);

    match prune_tile_tree(&config.root, config.dry_run).await {
        Ok(report) => {
            if config.dry_run {
                info!(
                    "Dry run: {} file(s) scanned, {} kept, {} would be removed",
                    report.scanned, report.kept, report.removed
                );
            } else {
                info!(
                    "{} file(s) scanned, {} kept, {} removed",
                    report.scanned, report.kept, report.removed
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_tiler=debug"
    } else {
        "wsi_tiler=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
