//! Tile tree maintenance.
//!
//! After reruns with different parameters a tile tree can accumulate stray
//! files: debug dumps, tiles from an older naming scheme, editor leftovers.
//! The prune pass walks each `level<n>` directory and removes every file
//! whose name does not parse as `<tx>_<ty>.jpg`. Subdirectories inside a
//! level directory are left alone.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TileError;

use super::writer::parse_tile_name;

/// Outcome of a prune pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PruneReport {
    /// Files inspected
    pub scanned: usize,

    /// Well-named tiles left in place
    pub kept: usize,

    /// Stray files removed (or, in dry-run mode, that would be removed)
    pub removed: usize,
}

impl PruneReport {
    fn absorb(&mut self, other: PruneReport) {
        self.scanned += other.scanned;
        self.kept += other.kept;
        self.removed += other.removed;
    }
}

/// Prune one level directory.
///
/// With `dry_run` set, stray files are reported but not deleted.
///
/// # Errors
///
/// Returns [`TileError::Write`] if the directory cannot be read or a stray
/// file cannot be removed.
pub async fn prune_level_dir(dir: &Path, dry_run: bool) -> Result<PruneReport, TileError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| TileError::Write {
        message: format!("read {}: {e}", dir.display()),
    })?;

    let mut report = PruneReport::default();
    while let Some(entry) = entries.next_entry().await.map_err(|e| TileError::Write {
        message: format!("read {}: {e}", dir.display()),
    })? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        report.scanned += 1;

        let well_named = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_tile_name)
            .is_some();
        if well_named {
            report.kept += 1;
            continue;
        }

        report.removed += 1;
        if dry_run {
            debug!("would remove {}", path.display());
        } else {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| TileError::Write {
                    message: format!("remove {}: {e}", path.display()),
                })?;
            debug!("removed {}", path.display());
        }
    }

    Ok(report)
}

/// Prune every `level<n>` directory under a tile root.
///
/// Directories not named `level<n>` are skipped with a warning; the tree may
/// legitimately contain other data next to the levels.
pub async fn prune_tile_tree(root: &Path, dry_run: bool) -> Result<PruneReport, TileError> {
    let mut entries = tokio::fs::read_dir(root).await.map_err(|e| TileError::Write {
        message: format!("read {}: {e}", root.display()),
    })?;

    let mut report = PruneReport::default();
    while let Some(entry) = entries.next_entry().await.map_err(|e| TileError::Write {
        message: format!("read {}: {e}", root.display()),
    })? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let is_level = entry
            .file_name()
            .to_str()
            .and_then(|n| n.strip_prefix("level"))
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()));
        if !is_level {
            warn!("skipping non-level directory {}", path.display());
            continue;
        }
        report.absorb(prune_level_dir(&path, dry_run).await?);
    }

    Ok(report)
}

// =============================================================================
// Tests
// =============================================================================
