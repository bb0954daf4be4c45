//! Tile grid planning.
//!
//! For one output level this module computes the tile grid and, per tile,
//! the level-0 pixel rectangle the tile covers. The final row and column are
//! ragged: their extent is whatever remains of the slide, never padded and
//! never dropped.
//!
//! Output level `L` is assigned downsample `2^L`, matching the pyramid
//! convention of tile viewers (level 0 = full resolution), independent of
//! whatever downsamples the slide natively stores. The source region
//! resolver reconciles the two spaces.

/// Canonical output tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Output downsample factor assigned to a level: `2^level`.
///
/// Saturates for absurd level indices instead of wrapping; such levels can
/// only come from corrupt metadata and their tiles fail geometry validation
/// downstream.
pub fn level_factor(level: usize) -> u64 {
    1u64.checked_shl(level as u32).unwrap_or(u64::MAX)
}

// =============================================================================
// Tile Grid
// =============================================================================

/// The tile grid of one output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// Output level index
    pub level: usize,

    /// Output downsample factor (`2^level`)
    pub factor: u64,

    /// Tile edge length in pixels
    pub tile_size: u32,

    /// Number of tile columns: `ceil(level_width / tile_size)`
    pub tiles_x: u32,

    /// Number of tile rows: `ceil(level_height / tile_size)`
    pub tiles_y: u32,
}

impl TileGrid {
    /// Plan the grid for a level of the given dimensions.
    pub fn new(level: usize, level_width: u64, level_height: u64, tile_size: u32) -> Self {
        Self {
            level,
            factor: level_factor(level),
            tile_size,
            tiles_x: level_width.div_ceil(tile_size as u64) as u32,
            tiles_y: level_height.div_ceil(tile_size as u64) as u32,
        }
    }

    /// Total number of tiles in the grid.
    pub fn tile_count(&self) -> u64 {
        self.tiles_x as u64 * self.tiles_y as u64
    }

    /// Enumerate tile coordinates in row-major order (`ty` outer, `tx` inner).
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> {
        let (tiles_x, tiles_y) = (self.tiles_x, self.tiles_y);
        (0..tiles_y).flat_map(move |ty| (0..tiles_x).map(move |tx| (tx, ty)))
    }

    /// Compute one tile's level-0 rectangle, clipped to the slide's level-0
    /// bounds.
    ///
    /// The extents are signed: when the level's own dimensions disagree with
    /// `width0 / factor` (corrupt or adversarial metadata) a tile's origin
    /// can fall past the slide edge, leaving a non-positive extent. Such
    /// plans are rejected by the source region resolver rather than clamped
    /// here.
    pub fn plan(&self, tx: u32, ty: u32, width0: u64, height0: u64) -> TilePlan {
        let span = self.tile_size as i64 * self.factor as i64;
        let x0 = tx as i64 * span;
        let y0 = ty as i64 * span;

        TilePlan {
            level: self.level,
            tx,
            ty,
            x0,
            y0,
            tile_w: span.min(width0 as i64 - x0),
            tile_h: span.min(height0 as i64 - y0),
        }
    }
}

// =============================================================================
// Tile Plan
// =============================================================================

/// One tile's place in level-0 pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    /// Output level index
    pub level: usize,

    /// Tile column
    pub tx: u32,

    /// Tile row
    pub ty: u32,

    /// Level-0 x origin: `tx * tile_size * factor`
    pub x0: i64,

    /// Level-0 y origin: `ty * tile_size * factor`
    pub y0: i64,

    /// Level-0 width, clipped to the slide edge (ragged last column)
    pub tile_w: i64,

    /// Level-0 height, clipped to the slide edge (ragged last row)
    pub tile_h: i64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_factor_powers_of_two() {
        assert_eq!(level_factor(0), 1);
        assert_eq!(level_factor(1), 2);
        assert_eq!(level_factor(5), 32);
        assert_eq!(level_factor(63), 1 << 63);
        assert_eq!(level_factor(64), u64::MAX);
    }

    #[test]
    fn test_grid_counts() {
        let grid = TileGrid::new(0, 600, 600, 256);
        assert_eq!((grid.tiles_x, grid.tiles_y), (3, 3));
        assert_eq!(grid.tile_count(), 9);

        let grid = TileGrid::new(1, 300, 300, 256);
        assert_eq!((grid.tiles_x, grid.tiles_y), (2, 2));

        // Exact fit
        let grid = TileGrid::new(0, 512, 256, 256);
        assert_eq!((grid.tiles_x, grid.tiles_y), (2, 1));

        // Smaller than one tile
        let grid = TileGrid::new(0, 100, 50, 256);
        assert_eq!((grid.tiles_x, grid.tiles_y), (1, 1));
    }

    #[test]
    fn test_ragged_last_column_level0() {
        let grid = TileGrid::new(0, 600, 600, 256);
        let plan = grid.plan(2, 0, 600, 600);
        assert_eq!(plan.x0, 512);
        assert_eq!(plan.tile_w, 88);
        assert_eq!(plan.tile_h, 256);
    }

    #[test]
    fn test_ragged_last_column_level1() {
        // 300-wide level at factor 2: second tile covers level-0 512..600
        let grid = TileGrid::new(1, 300, 300, 256);
        let plan = grid.plan(1, 1, 600, 600);
        assert_eq!(plan.x0, 512);
        assert_eq!(plan.tile_w, 88);
        assert_eq!(plan.tile_h, 88);
    }

    #[test]
    fn test_interior_tile_full_span() {
        let grid = TileGrid::new(1, 1000, 1000, 256);
        let plan = grid.plan(0, 0, 2000, 2000);
        assert_eq!((plan.x0, plan.y0), (0, 0));
        assert_eq!(plan.tile_w, 512);
        assert_eq!(plan.tile_h, 512);
    }

    #[test]
    fn test_every_rectangle_contained_in_level0_bounds() {
        let (width0, height0) = (46920u64, 33600u64);
        for level in 0..4 {
            let factor = level_factor(level);
            let lw = width0.div_ceil(factor);
            let lh = height0.div_ceil(factor);
            let grid = TileGrid::new(level, lw, lh, 256);
            for (tx, ty) in grid.coords() {
                let plan = grid.plan(tx, ty, width0, height0);
                assert!(plan.tile_w > 0 && plan.tile_h > 0, "dropped tile at {tx},{ty}");
                assert!(plan.x0 >= 0 && plan.y0 >= 0);
                assert!(plan.x0 + plan.tile_w <= width0 as i64);
                assert!(plan.y0 + plan.tile_h <= height0 as i64);
            }
        }
    }

    #[test]
    fn test_inconsistent_metadata_yields_negative_extent() {
        // Level claims to be wider than the slide supports at this factor
        let grid = TileGrid::new(1, 1000, 1000, 256);
        let plan = grid.plan(1, 0, 300, 300);
        assert!(plan.tile_w <= 0);
    }

    #[test]
    fn test_coords_row_major() {
        let grid = TileGrid::new(0, 600, 300, 256);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], (0, 0));
        assert_eq!(coords[1], (1, 0));
        assert_eq!(coords[3], (0, 1));
        assert_eq!(coords[5], (2, 1));
    }
}
