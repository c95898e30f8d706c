//! Spawning seekers on the map's spawn tiles.

use horde_core::Point;
use horde_paths::TileGrid;
use log::debug;
use rand::Rng;
use rand::seq::IndexedRandom;

/// Releases a round of seekers at a fixed tick interval.
#[derive(Clone, Debug)]
pub struct Spawner {
    tiles: Vec<usize>,
    interval: u64,
    left: u32,
    min_distance: i32,
}

impl Spawner {
    /// A spawner releasing `quota` seekers from `tiles`, one every
    /// `interval` ticks. Tiles within `min_distance` world units of the
    /// survivor are avoided while others exist.
    pub fn new(tiles: Vec<usize>, interval: u64, quota: u32, min_distance: i32) -> Self {
        Self {
            tiles,
            interval: interval.max(1),
            left: quota,
            min_distance,
        }
    }

    /// Seekers still to be released this round.
    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn tiles(&self) -> &[usize] {
        &self.tiles
    }

    /// Spawn tiles allowed for a survivor at `survivor`.
    pub fn candidates(&self, grid: &TileGrid, survivor: Point) -> Vec<usize> {
        let min = i64::from(self.min_distance);
        let far: Vec<usize> = self
            .tiles
            .iter()
            .copied()
            .filter(|&t| {
                grid.pos(t)
                    .is_some_and(|p| p.distance_sq(survivor) > min * min)
            })
            .collect();
        if far.is_empty() {
            self.tiles.clone()
        } else {
            far
        }
    }

    /// The tile to spawn on at `tick`, if one is due.
    pub fn tick(
        &mut self,
        tick: u64,
        grid: &TileGrid,
        survivor: Point,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        if self.left == 0 || tick % self.interval != 0 {
            return None;
        }
        let tile = *self.candidates(grid, survivor).choose(rng)?;
        self.left -= 1;
        debug!("spawn on tile {tile}, {} left this round", self.left);
        Some(tile)
    }
}
