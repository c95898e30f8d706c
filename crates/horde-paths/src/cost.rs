use horde_core::Point;

use crate::TileGrid;

/// Cost of one cardinal step between adjacent tiles.
pub const STEP_COST: i32 = 10;

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Edge costs and the remaining-distance estimate for one tile size.
///
/// The estimate is the Manhattan distance in world units scaled by
/// `STEP_COST / tile_size`, so one tile of distance costs exactly one step.
/// With cardinal moves only it never overestimates and is consistent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CostModel {
    tile_size: i32,
}

impl CostModel {
    /// Cost model for tiles of `tile_size` world units (clamped to at least 1).
    pub const fn new(tile_size: i32) -> Self {
        Self {
            tile_size: if tile_size > 0 { tile_size } else { 1 },
        }
    }

    /// Cost model matching `grid`'s tile size.
    pub fn for_grid(grid: &TileGrid) -> Self {
        Self::new(grid.tile_size())
    }

    /// Cost of moving between two adjacent passable tiles.
    #[inline]
    pub const fn step_cost(&self) -> i32 {
        STEP_COST
    }

    /// Heuristic cost from world position `from` to `goal`.
    #[inline]
    pub fn estimate(&self, from: Point, goal: Point) -> i32 {
        manhattan(from, goal) * STEP_COST / self.tile_size
    }
}
