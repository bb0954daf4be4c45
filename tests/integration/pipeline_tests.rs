//! End-to-end pipeline tests over in-memory slides.

use std::path::Path;
use std::sync::Arc;

use image::{Rgb, Rgba, RgbaImage};

use wsi_tiler::pipeline::{PipelineConfig, SkipReason, TilePipeline};
use wsi_tiler::slide::{open_image_slide, pyramid_from_rgba};

use super::test_utils::{
    slide_600, tile_dimensions, tile_names, transparent_slide_600, FailingSlide,
};

fn test_pipeline() -> TilePipeline {
    TilePipeline::new(PipelineConfig {
        workers: 4,
        ..PipelineConfig::default()
    })
}

#[tokio::test]
async fn test_two_level_slide_produces_expected_tile_tree() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let summary = test_pipeline()
        .run(Arc::new(slide_600()), &out)
        .await
        .unwrap();

    // 600x600 at 256 -> 3x3, 300x300 at 256 -> 2x2
    assert_eq!(summary.written, 13);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.levels.len(), 2);
    assert_eq!(
        (summary.levels[0].tiles_x, summary.levels[0].tiles_y),
        (3, 3)
    );
    assert_eq!(
        (summary.levels[1].tiles_x, summary.levels[1].tiles_y),
        (2, 2)
    );
    assert_eq!(summary.levels[0].factor, 1);
    assert_eq!(summary.levels[1].factor, 2);

    assert_eq!(tile_names(&out.join("level0")).len(), 9);
    assert_eq!(
        tile_names(&out.join("level1")),
        vec!["0_0.jpg", "0_1.jpg", "1_0.jpg", "1_1.jpg"]
    );
}

#[tokio::test]
async fn test_every_written_tile_is_canonical_size() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    test_pipeline()
        .run(Arc::new(slide_600()), &out)
        .await
        .unwrap();

    for level in 0..2 {
        let level_dir = out.join(format!("level{level}"));
        for name in tile_names(&level_dir) {
            let dims = tile_dimensions(&level_dir.join(&name));
            assert_eq!(dims, (256, 256), "tile {level}/{name}");
        }
    }
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");
    let pipeline = test_pipeline();
    let slide = Arc::new(slide_600());

    let first = pipeline.run(Arc::clone(&slide), &out).await.unwrap();
    let probe = out.join("level0").join("2_2.jpg");
    let bytes_first = std::fs::read(&probe).unwrap();

    let second = pipeline.run(slide, &out).await.unwrap();
    let bytes_second = std::fs::read(&probe).unwrap();

    assert_eq!(first.written, second.written);
    assert_eq!(tile_names(&out.join("level0")).len(), 9);
    assert_eq!(tile_names(&out.join("level1")).len(), 4);
    // Overwrites regenerate identical content
    assert_eq!(bytes_first, bytes_second);
}

#[tokio::test]
async fn test_transparent_slide_renders_background_color() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let pipeline = TilePipeline::new(PipelineConfig {
        background: Rgb([200, 30, 40]),
        workers: 2,
        ..PipelineConfig::default()
    });
    pipeline
        .run(Arc::new(transparent_slide_600()), &out)
        .await
        .unwrap();

    let img = image::open(out.join("level1").join("0_0.jpg"))
        .unwrap()
        .to_rgb8();
    let Rgb([r, g, b]) = *img.get_pixel(128, 128);
    // JPEG is lossy; a solid color still decodes close to itself
    assert!((r as i32 - 200).abs() <= 6, "r={r}");
    assert!((g as i32 - 30).abs() <= 6, "g={g}");
    assert!((b as i32 - 40).abs() <= 6, "b={b}");
}

#[tokio::test]
async fn test_read_failures_skip_tiles_but_finish_run() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let slide = FailingSlide {
        width: 600,
        height: 600,
    };
    let summary = test_pipeline().run(Arc::new(slide), &out).await.unwrap();

    assert_eq!(summary.written, 0);
    assert_eq!(summary.skipped, 9);
    assert_eq!(summary.skipped_tiles.len(), 9);
    assert!(summary
        .skipped_tiles
        .iter()
        .all(|t| t.reason == SkipReason::ReadFailed));

    // Skips are sorted by (level, ty, tx) for deterministic reporting
    let coords: Vec<_> = summary
        .skipped_tiles
        .iter()
        .map(|t| (t.level, t.ty, t.tx))
        .collect();
    let mut sorted = coords.clone();
    sorted.sort();
    assert_eq!(coords, sorted);
}

#[tokio::test]
async fn test_fatal_open_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let result = open_image_slide(Path::new("/nonexistent/slide.png"), 256);
    assert!(result.is_err());

    // Nothing was written and no directories were created
    assert!(!out.exists());
}

#[tokio::test]
async fn test_flat_image_adapter_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let img = RgbaImage::from_fn(600, 600, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 99, 255])
    });
    let slide = pyramid_from_rgba(&img, 256).unwrap();

    let summary = test_pipeline().run(Arc::new(slide), &out).await.unwrap();

    // 600 -> 300 -> 150: three levels, 9 + 4 + 1 tiles
    assert_eq!(summary.levels.len(), 3);
    assert_eq!(summary.written, 14);
    assert_eq!(tile_names(&out.join("level2")), vec!["0_0.jpg"]);
}

#[tokio::test]
async fn test_summary_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let summary = test_pipeline()
        .run(Arc::new(slide_600()), &out)
        .await
        .unwrap();

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["written"], 13);
    assert_eq!(value["tile_size"], 256);
    assert_eq!(value["levels"][1]["tiles_x"], 2);
}
