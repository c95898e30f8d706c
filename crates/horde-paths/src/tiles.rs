//! The static tile grid searched by the pathfinder.

use horde_core::{Direction, MapDescription, MapError, Point, Range};
use thiserror::Error;

use crate::STEP_COST;

/// One tile of the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    /// Row-major index, 0 at the top-left corner.
    pub index: usize,
    /// Top-left corner in world units.
    pub pos: Point,
    pub walkable: bool,
}

/// A horizontal run of consecutive blocked tiles within one row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolidRun {
    /// Index of the leftmost tile of the run.
    pub first: usize,
    pub len: usize,
}

/// Uniform grid of square tiles.
///
/// Tiles are created once and never change, so a `TileGrid` is shared
/// read-only between the simulation and the search worker.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: i32,
    bounds: Range,
    tiles: Vec<Tile>,
    solids: Vec<usize>,
    spawns: Vec<usize>,
}

impl TileGrid {
    /// Build a grid from per-tile walkability in row-major order.
    pub fn from_walkable(
        width: usize,
        height: usize,
        walkable: Vec<bool>,
        tile_size: i32,
    ) -> Result<Self, GridError> {
        if tile_size <= 0 {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        let expected = width.checked_mul(height).ok_or(GridError::TooLarge)?;
        if walkable.len() != expected {
            return Err(GridError::DimensionMismatch {
                width,
                height,
                expected,
                found: walkable.len(),
            });
        }
        if expected == 0 {
            return Err(GridError::Empty);
        }
        let w = i32::try_from(width).map_err(|_| GridError::TooLarge)?;
        let h = i32::try_from(height).map_err(|_| GridError::TooLarge)?;
        if worst_cost(expected, w, h, tile_size).is_none_or(|c| c > i64::from(i32::MAX)) {
            return Err(GridError::TooLarge);
        }

        let bounds = Range::sized(w, h);
        let tiles: Vec<Tile> = bounds
            .iter()
            .zip(walkable)
            .enumerate()
            .map(|(index, (p, walkable))| Tile {
                index,
                pos: p * tile_size,
                walkable,
            })
            .collect();
        let solids = tiles
            .iter()
            .filter(|t| !t.walkable)
            .map(|t| t.index)
            .collect();

        Ok(Self {
            width,
            height,
            tile_size,
            bounds,
            tiles,
            solids,
            spawns: Vec::new(),
        })
    }

    /// Build a grid from a parsed map, keeping its spawn tiles.
    pub fn from_map(map: &MapDescription, tile_size: i32) -> Result<Self, GridError> {
        let walkable = map.blocked().iter().map(|&b| !b).collect();
        let mut grid = Self::from_walkable(map.width(), map.height(), walkable, tile_size)?;
        grid.spawns = map.spawns().to_vec();
        Ok(grid)
    }

    /// Parse map text and build a grid from it.
    pub fn parse(s: &str, tile_size: i32) -> Result<Self, GridError> {
        Self::from_map(&MapDescription::parse(s)?, tile_size)
    }

    /// A grid with no blocked tiles.
    pub fn open(width: usize, height: usize, tile_size: i32) -> Result<Self, GridError> {
        let len = width.checked_mul(height).ok_or(GridError::TooLarge)?;
        Self::from_walkable(width, height, vec![true; len], tile_size)
    }

    /// Tiles per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Side length of a tile in world units.
    #[inline]
    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Total number of tiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always `false`: construction rejects empty grids.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All tiles in index order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[inline]
    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Whether tile `index` exists and is walkable.
    #[inline]
    pub fn is_walkable(&self, index: usize) -> bool {
        self.tiles.get(index).is_some_and(|t| t.walkable)
    }

    /// Top-left corner of tile `index` in world units.
    #[inline]
    pub fn pos(&self, index: usize) -> Option<Point> {
        self.tiles.get(index).map(|t| t.pos)
    }

    /// Centre of tile `index` in world units.
    pub fn centre(&self, index: usize) -> Option<Point> {
        let half = self.tile_size / 2;
        self.pos(index).map(|p| p.shift(half, half))
    }

    /// Indices of blocked tiles in ascending order.
    pub fn solids(&self) -> &[usize] {
        &self.solids
    }

    /// Spawn tile indices carried over from the map.
    pub fn spawns(&self) -> &[usize] {
        &self.spawns
    }

    /// Iterate over the indices of walkable tiles.
    pub fn walkable_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.tiles.iter().filter(|t| t.walkable).map(|t| t.index)
    }

    /// Index of the tile containing world position `pos`.
    pub fn tile_at(&self, pos: Point) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let cell = pos / self.tile_size;
        if !self.bounds.contains(cell) {
            return None;
        }
        Some(cell.y as usize * self.width + cell.x as usize)
    }

    /// Whether `candidate`, reached from a tile by one step in `direction`,
    /// is a real neighbour.
    ///
    /// Row-major indexing makes a step east from the last column land on the
    /// first column of the next row (and west the other way), so horizontal
    /// steps are also checked against the row boundary. Candidates outside
    /// `[0, len)` are always rejected.
    pub fn on_screen(&self, direction: Direction, candidate: isize) -> bool {
        let len = self.tiles.len() as isize;
        let w = self.width as isize;
        if candidate < 0 || candidate >= len {
            return false;
        }
        match direction {
            Direction::East => candidate % w != 0,
            Direction::West => candidate % w != w - 1,
            Direction::North | Direction::South => true,
        }
    }

    /// The tile one step from `index` in `direction`, if there is one.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        if index >= self.tiles.len() {
            return None;
        }
        let step = match direction {
            Direction::North => -(self.width as isize),
            Direction::South => self.width as isize,
            Direction::East => 1,
            Direction::West => -1,
        };
        let candidate = index as isize + step;
        self.on_screen(direction, candidate).then_some(candidate as usize)
    }

    /// Neighbours of `index` in north, south, east, west order.
    ///
    /// Walkability is not checked here; the search decides what it may enter.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.neighbor(index, d))
    }

    /// The walkable tile closest to tile `index`, by squared Euclidean
    /// distance between tile positions. Ties go to the lower index.
    pub fn nearest_walkable(&self, index: usize) -> Option<usize> {
        let origin = self.pos(index)?;
        if self.is_walkable(index) {
            return Some(index);
        }
        self.tiles
            .iter()
            .filter(|t| t.walkable)
            .min_by_key(|t| t.pos.distance_sq(origin))
            .map(|t| t.index)
    }

    /// Blocked tiles compressed into horizontal runs; a new run starts on
    /// every row.
    pub fn solid_runs(&self) -> Vec<SolidRun> {
        let mut runs = Vec::new();
        for row in self.tiles.chunks(self.width) {
            let mut current: Option<SolidRun> = None;
            for t in row {
                if t.walkable {
                    runs.extend(current.take());
                } else if let Some(run) = current.as_mut() {
                    run.len += 1;
                } else {
                    current = Some(SolidRun {
                        first: t.index,
                        len: 1,
                    });
                }
            }
            runs.extend(current);
        }
        runs
    }
}

/// Largest `f` a search on this grid can produce, if it fits in `i64`.
///
/// A path has at most one step per tile, and the heuristic scales the
/// world-unit manhattan span by [`STEP_COST`] before dividing by the tile
/// size. The sum of both bounds every `f` and every intermediate product.
fn worst_cost(len: usize, width: i32, height: i32, tile_size: i32) -> Option<i64> {
    let step = i64::from(STEP_COST);
    let span = (i64::from(width) + i64::from(height)).checked_mul(i64::from(tile_size))?;
    let g = i64::try_from(len).ok()?.checked_mul(step)?;
    g.checked_add(span.checked_mul(step)?)
}

/// Errors raised while building a [`TileGrid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(i32),
    #[error("grid declares {width}x{height} ({expected} tiles) but {found} were given")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid has no tiles")]
    Empty,
    #[error("grid is too large for search costs to fit in i32")]
    TooLarge,
    #[error(transparent)]
    Map(#[from] MapError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "\
#####
#Z..#
#.#.#
#..Z#
#####";

    #[test]
    fn positions_follow_index() {
        let grid = TileGrid::open(4, 3, 10).unwrap();
        assert_eq!(grid.len(), 12);
        for t in grid.tiles() {
            let expected = Point::new((t.index % 4) as i32, (t.index / 4) as i32) * 10;
            assert_eq!(t.pos, expected);
        }
        assert_eq!(grid.centre(5), Some(Point::new(15, 15)));
    }

    #[test]
    fn neighbors_do_not_wrap_rows() {
        let grid = TileGrid::open(4, 3, 10).unwrap();
        // Last column of row 0: no east neighbour.
        assert_eq!(grid.neighbors(3).collect::<Vec<_>>(), vec![7, 2]);
        // First column of row 1: no west neighbour.
        assert_eq!(grid.neighbors(4).collect::<Vec<_>>(), vec![0, 8, 5]);
        // Interior tile has all four.
        assert_eq!(grid.neighbors(5).collect::<Vec<_>>(), vec![1, 9, 6, 4]);
    }

    #[test]
    fn top_row_has_no_north_neighbor() {
        let grid = TileGrid::open(4, 3, 10).unwrap();
        assert_eq!(grid.neighbor(1, Direction::North), None);
        assert_eq!(grid.neighbor(4, Direction::North), Some(0));
        assert_eq!(grid.neighbor(9, Direction::South), None);
        assert!(!grid.on_screen(Direction::North, -3));
        assert!(!grid.on_screen(Direction::South, 12));
    }

    #[test]
    fn single_column_grid_has_no_horizontal_neighbors() {
        let grid = TileGrid::open(1, 3, 10).unwrap();
        assert_eq!(grid.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn tile_at_floors_world_positions() {
        let grid = TileGrid::open(4, 3, 10).unwrap();
        assert_eq!(grid.tile_at(Point::new(0, 0)), Some(0));
        assert_eq!(grid.tile_at(Point::new(19, 9)), Some(1));
        assert_eq!(grid.tile_at(Point::new(35, 25)), Some(11));
        assert_eq!(grid.tile_at(Point::new(40, 0)), None);
        assert_eq!(grid.tile_at(Point::new(-1, 0)), None);
    }

    #[test]
    fn from_map_keeps_walls_and_spawns() {
        let grid = TileGrid::parse(ROOM, 8).unwrap();
        assert_eq!(grid.width(), 5);
        assert!(!grid.is_walkable(0));
        assert!(grid.is_walkable(6));
        assert!(!grid.is_walkable(12));
        assert_eq!(grid.spawns(), &[6, 18]);
        assert_eq!(grid.solids().len() + grid.walkable_indices().count(), grid.len());
    }

    #[test]
    fn nearest_walkable_prefers_lowest_index_on_ties() {
        let grid = TileGrid::parse(ROOM, 8).unwrap();
        // Tile 12 is the wall in the middle; 7, 11, 13 and 17 are equally close.
        assert_eq!(grid.nearest_walkable(12), Some(7));
        // Corner wall: 6 is the only tile at distance²=2 tiles.
        assert_eq!(grid.nearest_walkable(0), Some(6));
        assert_eq!(grid.nearest_walkable(8), Some(8));
        assert_eq!(grid.nearest_walkable(100), None);
    }

    #[test]
    fn nearest_walkable_on_all_walls() {
        let grid = TileGrid::parse("##\n##", 8).unwrap();
        assert_eq!(grid.nearest_walkable(0), None);
    }

    #[test]
    fn solid_runs_restart_each_row() {
        let grid = TileGrid::parse("##..###\n#######\n.......", 8).unwrap();
        let runs = grid.solid_runs();
        assert_eq!(
            runs,
            vec![
                SolidRun { first: 0, len: 2 },
                SolidRun { first: 4, len: 3 },
                SolidRun { first: 7, len: 7 },
            ]
        );
        let total: usize = runs.iter().map(|r| r.len).sum();
        assert_eq!(total, grid.solids().len());
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            TileGrid::open(2, 2, 0).unwrap_err(),
            GridError::InvalidTileSize(0)
        );
        assert_eq!(
            TileGrid::from_walkable(3, 3, vec![true; 8], 10).unwrap_err(),
            GridError::DimensionMismatch {
                width: 3,
                height: 3,
                expected: 9,
                found: 8
            }
        );
        assert_eq!(TileGrid::open(0, 5, 10).unwrap_err(), GridError::Empty);
        assert!(matches!(
            TileGrid::parse("#\n##", 10),
            Err(GridError::Map(MapError::RaggedRow { .. }))
        ));
    }

    #[test]
    fn search_costs_bound_the_grid_size() {
        // (7 tiles + 8 * tile) * STEP_COST is the largest f on a 7x1 row.
        assert!(TileGrid::open(7, 1, 26_843_544).is_ok());
        assert_eq!(
            TileGrid::open(7, 1, 26_843_545).unwrap_err(),
            GridError::TooLarge
        );
        assert_eq!(
            TileGrid::open(7, 1, 300_000_000).unwrap_err(),
            GridError::TooLarge
        );
    }
}
