//! Pruning a tile tree produced by a real pipeline run.

use std::sync::Arc;

use wsi_tiler::pipeline::{PipelineConfig, TilePipeline};
use wsi_tiler::tile::prune_tile_tree;

use super::test_utils::{slide_600, tile_names};

#[tokio::test]
async fn test_prune_after_run_keeps_all_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let pipeline = TilePipeline::new(PipelineConfig {
        workers: 2,
        ..PipelineConfig::default()
    });
    pipeline.run(Arc::new(slide_600()), &out).await.unwrap();

    // Pollute the tree with strays of various shapes
    std::fs::write(out.join("level0").join("0_0_LQ.jpg"), b"old naming").unwrap();
    std::fs::write(out.join("level0").join("thumb.png"), b"debug dump").unwrap();
    std::fs::write(out.join("level1").join(".0_0.jpg.tmp"), b"partial").unwrap();

    let report = prune_tile_tree(&out, false).await.unwrap();
    assert_eq!(report.scanned, 16);
    assert_eq!(report.kept, 13);
    assert_eq!(report.removed, 3);

    assert_eq!(tile_names(&out.join("level0")).len(), 9);
    assert_eq!(tile_names(&out.join("level1")).len(), 4);
}

#[tokio::test]
async fn test_prune_dry_run_reports_without_deleting() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");

    let pipeline = TilePipeline::new(PipelineConfig {
        workers: 2,
        ..PipelineConfig::default()
    });
    pipeline.run(Arc::new(slide_600()), &out).await.unwrap();

    let stray = out.join("level1").join("leftover.bin");
    std::fs::write(&stray, b"stray").unwrap();

    let report = prune_tile_tree(&out, true).await.unwrap();
    assert_eq!(report.removed, 1);
    assert!(stray.exists());
}
