//! Tile persistence.
//!
//! Tiles land at a deterministic path derived from their coordinates:
//! `<root>/level<level>/<tx>_<ty>.jpg`. Level directories are created
//! on demand and creation is idempotent; reruns overwrite tiles in place.

use std::path::{Path, PathBuf};

use crate::error::TileError;

/// File extension for encoded tiles.
pub const TILE_EXTENSION: &str = "jpg";

// =============================================================================
// Tile Writer
// =============================================================================

/// Writes encoded tiles under a root directory.
#[derive(Debug, Clone)]
pub struct TileWriter {
    root: PathBuf,
}

impl TileWriter {
    /// Create a writer rooted at `root`. No directories are touched until
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root tile directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one level's tiles: `<root>/level<level>`.
    pub fn level_dir(&self, level: usize) -> PathBuf {
        self.root.join(format!("level{level}"))
    }

    /// Full path of one tile: `<root>/level<level>/<tx>_<ty>.jpg`.
    pub fn tile_path(&self, level: usize, tx: u32, ty: u32) -> PathBuf {
        self.level_dir(level)
            .join(format!("{tx}_{ty}.{TILE_EXTENSION}"))
    }

    /// Create a level's directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Write`] on filesystem failure; an already
    /// existing directory is not a failure.
    pub async fn ensure_level_dir(&self, level: usize) -> Result<(), TileError> {
        let dir = self.level_dir(level);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TileError::Write {
                message: format!("create {}: {e}", dir.display()),
            })
    }

    /// Persist one encoded tile, overwriting any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Write`] on filesystem failure.
    pub async fn write(
        &self,
        level: usize,
        tx: u32,
        ty: u32,
        data: &[u8],
    ) -> Result<(), TileError> {
        let path = self.tile_path(level, tx, ty);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| TileError::Write {
                message: format!("write {}: {e}", path.display()),
            })
    }
}

// =============================================================================
// Tile Names
// =============================================================================

/// Parse tile coordinates from a filename like `3_5.jpg` or `3_5`.
///
/// Returns `(tx, ty)`, or `None` for anything that is not a well-formed
/// tile name. Used both for path round-trips and to recognize stray files
/// during pruning.
pub fn parse_tile_name(filename: &str) -> Option<(u32, u32)> {
    let name = filename
        .strip_suffix(".jpg")
        .or_else(|| filename.strip_suffix(".jpeg"))
        .unwrap_or(filename);

    let (x, y) = name.split_once('_')?;
    if y.contains('_') {
        return None;
    }

    Some((x.parse().ok()?, y.parse().ok()?))
}

// =============================================================================
// Tests
// =============================================================================
