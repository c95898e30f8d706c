//! Simulation options, loaded from TOML and checked before a run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use horde_paths::SchedulerMode;
use serde::Deserialize;
use thiserror::Error;

use crate::seeker::RoutePolicy;
use crate::speed::{self, SeekerKind, SpeedTiers};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid options file")]
    Parse(#[from] toml::de::Error),
    #[error("invalid option: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Side of a tile in world units.
    pub tile_length: i32,
    /// Simulation ticks per second.
    pub fps: u32,
    pub route_policy: RoutePolicy,
    pub scheduler: SchedulerMode,
    pub seed: u64,
    pub spawn_interval_secs: u32,
    /// Seekers avoid spawning closer than this to the survivor.
    pub spawn_min_distance: i32,
    /// Seekers released in the first round.
    pub initial_round: u32,
    /// Duration of power-up effects.
    pub effect_secs: u32,
    /// Contact distance in tiles.
    pub attack_range_tiles: f32,
    /// Seeker kinds whose routes ignore walls.
    pub wall_walkers: Vec<SeekerKind>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tile_length: 24,
            fps: 60,
            route_policy: RoutePolicy::Replan,
            scheduler: SchedulerMode::Background,
            seed: 0,
            spawn_interval_secs: 2,
            spawn_min_distance: 150,
            initial_round: 10,
            effect_secs: 5,
            attack_range_tiles: 1.3,
            wall_walkers: Vec::new(),
        }
    }
}

impl Options {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Check the ranges the movement model depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10 < self.fps && self.fps < 180) {
            return Err(ConfigError::Invalid(format!(
                "fps must be between 10 and 180 exclusive, got {}",
                self.fps
            )));
        }
        if !(11 < self.tile_length && self.tile_length < 100) {
            return Err(ConfigError::Invalid(format!(
                "tile length must be between 11 and 100 exclusive, got {}",
                self.tile_length
            )));
        }
        if is_prime(self.tile_length) {
            return Err(ConfigError::Invalid(format!(
                "tile length must not be prime, got {}",
                self.tile_length
            )));
        }
        if self.attack_range_tiles.is_nan() || self.attack_range_tiles < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "attack range must be non-negative, got {}",
                self.attack_range_tiles
            )));
        }
        Ok(())
    }

    /// Survivor speed in world units per tick.
    pub fn speed(&self) -> i32 {
        speed::base_speed(self.tile_length, self.fps)
    }

    pub fn speed_tiers(&self) -> SpeedTiers {
        speed::speed_tiers(self.speed(), self.tile_length)
    }

    pub fn spawn_interval_ticks(&self) -> u64 {
        u64::from(self.fps) * u64::from(self.spawn_interval_secs)
    }

    pub fn effect_ticks(&self) -> u32 {
        self.fps.saturating_mul(self.effect_secs)
    }

    /// Contact distance in world units.
    pub fn attack_range(&self) -> f32 {
        self.tile_length as f32 * self.attack_range_tiles
    }
}

fn is_prime(n: i32) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}
