//! Headless simulation: a wandering survivor, the horde chasing it, spawning
//! and timed effects, advanced one fixed tick at a time.

use std::fmt;
use std::sync::Arc;

use horde_core::{Direction, MapDescription, Point};
use horde_paths::{GridError, SchedulerError, TileGrid};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::config::{ConfigError, Options};
use crate::effects::{Effect, Modifiers};
use crate::horde::{Horde, HordeStats};
use crate::seeker::SeekerId;
use crate::spawn::Spawner;
use crate::speed::{SeekerKind, SpeedTiers};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build the tile grid")]
    Grid(#[from] GridError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("the map has no walkable tile for the survivor")]
    NoOpenTile,
}

/// The pursued target, moving tile to tile at a fixed speed.
#[derive(Clone, Debug)]
struct Survivor {
    pos: Point,
    to: Option<Point>,
    vel: Point,
    speed: i32,
}

impl Survivor {
    /// Move toward the current tile, or pick a random neighbouring one.
    fn step(&mut self, grid: &TileGrid, through_walls: bool, rng: &mut StdRng) {
        if let Some(to) = self.to {
            if self.pos == to {
                self.to = None;
            } else {
                self.pos += self.vel;
            }
            return;
        }
        let Some(here) = grid.tile_at(self.pos) else {
            return;
        };
        let options: Vec<(Direction, usize)> = Direction::ALL
            .into_iter()
            .filter_map(|d| grid.neighbor(here, d).map(|n| (d, n)))
            .filter(|&(_, n)| through_walls || grid.is_walkable(n))
            .collect();
        if let Some(&(dir, next)) = options.choose(rng) {
            self.to = grid.pos(next);
            self.vel = dir.offset() * self.speed;
        }
    }
}

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub survivor: Point,
    pub seekers: usize,
    pub moved: usize,
    pub scheduled: usize,
    pub applied: usize,
    /// Seekers within attack range of the survivor.
    pub contacts: usize,
    pub spawned: Option<SeekerId>,
    pub expired: Vec<Effect>,
}

/// Totals for a whole run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub seekers: usize,
    pub contacts: u64,
    pub survivor: Point,
    pub searches: HordeStats,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} seekers, {} contact ticks, {} searches ({} found, {} unreachable)",
            self.ticks,
            self.seekers,
            self.contacts,
            self.searches.scheduled,
            self.searches.found,
            self.searches.unreachable
        )
    }
}

pub struct Simulation {
    opts: Options,
    grid: Arc<TileGrid>,
    horde: Horde,
    spawner: Spawner,
    modifiers: Modifiers,
    survivor: Survivor,
    tiers: SpeedTiers,
    rng: StdRng,
    tick: u64,
    contacts: u64,
}

impl Simulation {
    /// Validate `opts` and set up a run on `map`.
    pub fn new(opts: Options, map: &MapDescription) -> Result<Self, SimError> {
        opts.validate()?;
        let grid = Arc::new(TileGrid::from_map(map, opts.tile_length)?);
        let mut rng = StdRng::seed_from_u64(opts.seed);

        let open: Vec<usize> = grid.walkable_indices().collect();
        let start = *open.choose(&mut rng).ok_or(SimError::NoOpenTile)?;
        let survivor = Survivor {
            pos: grid.pos(start).ok_or(SimError::NoOpenTile)?,
            to: None,
            vel: Point::ZERO,
            speed: opts.speed(),
        };

        let horde = Horde::new(Arc::clone(&grid), opts.scheduler, opts.route_policy)?;
        let spawner = Spawner::new(
            grid.spawns().to_vec(),
            opts.spawn_interval_ticks(),
            opts.initial_round,
            opts.spawn_min_distance,
        );
        let tiers = opts.speed_tiers();
        info!(
            "{}x{} map, tile {}, survivor speed {}, seeker speeds {:?}, {} spawn tiles",
            grid.width(),
            grid.height(),
            grid.tile_size(),
            survivor.speed,
            tiers.as_array(),
            spawner.tiles().len()
        );

        Ok(Self {
            opts,
            grid,
            horde,
            spawner,
            modifiers: Modifiers::new(),
            survivor,
            tiers,
            rng,
            tick: 0,
            contacts: 0,
        })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn horde(&self) -> &Horde {
        &self.horde
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn survivor(&self) -> Point {
        self.survivor.pos
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Start `effect` for the configured effect duration.
    pub fn activate(&mut self, effect: Effect) {
        info!("tick {}: {effect} picked up", self.tick);
        self.modifiers.activate(effect, self.opts.effect_ticks());
    }

    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        let through_walls = self.modifiers.is_active(Effect::ThroughWalls);
        self.survivor.step(&self.grid, through_walls, &mut self.rng);

        let update = self.horde.update(self.survivor.pos, &self.modifiers)?;

        let mut spawned = None;
        if let Some(tile) = self
            .spawner
            .tick(self.tick, &self.grid, self.survivor.pos, &mut self.rng)
        {
            let kind = SeekerKind::random(&mut self.rng);
            spawned = self.horde.spawn(kind, tile, self.tiers.get(kind));
            if let Some(id) = spawned {
                if self.opts.wall_walkers.contains(&kind) {
                    self.horde.set_wall_walker(id, true);
                }
            }
        }

        let range = self.opts.attack_range();
        let contacts = self
            .horde
            .seekers()
            .filter(|s| {
                let d = s.pos().distance_sq(self.survivor.pos) as f64;
                d.sqrt() <= f64::from(range)
            })
            .count();
        self.contacts += contacts as u64;

        let expired = self.modifiers.tick();
        if expired.contains(&Effect::ThroughWalls) {
            self.leave_walls();
        }

        let report = TickReport {
            tick: self.tick,
            survivor: self.survivor.pos,
            seekers: self.horde.len(),
            moved: update.moved,
            scheduled: update.scheduled,
            applied: update.applied,
            contacts,
            spawned,
            expired,
        };
        self.tick += 1;
        Ok(report)
    }

    /// Put the survivor back on the closest walkable tile.
    fn leave_walls(&mut self) {
        let snapped = self
            .grid
            .tile_at(self.survivor.pos)
            .and_then(|t| self.grid.nearest_walkable(t))
            .and_then(|t| self.grid.pos(t));
        if let Some(pos) = snapped {
            debug!("survivor leaves walls at {pos}");
            self.survivor.pos = pos;
        }
        self.survivor.to = None;
        self.survivor.vel = Point::ZERO;
    }

    /// Wait for the outstanding search and summarise the run.
    pub fn finish(mut self) -> Result<RunSummary, SimError> {
        self.horde.flush()?;
        Ok(RunSummary {
            ticks: self.tick,
            seekers: self.horde.len(),
            contacts: self.contacts,
            survivor: self.survivor.pos,
            searches: self.horde.stats(),
        })
    }
}
