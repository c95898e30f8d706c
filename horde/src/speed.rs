//! Seeker kinds and their discrete speeds.
//!
//! All speeds divide the tile length exactly, so a seeker moving from one
//! tile position always lands on the next one without overshooting.

use std::fmt;

use rand::Rng;
use serde::Deserialize;

/// Variety of seeker, fixing its speed tier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekerKind {
    Walker,
    Runner,
    Brute,
    Crawler,
}

impl SeekerKind {
    pub const ALL: [SeekerKind; 4] = [
        SeekerKind::Walker,
        SeekerKind::Runner,
        SeekerKind::Brute,
        SeekerKind::Crawler,
    ];

    /// Speed of this kind relative to a quarter of the base speed.
    const fn factor(self) -> f64 {
        match self {
            Self::Walker => 2.0,
            Self::Runner => 3.0,
            Self::Brute => 2.0,
            Self::Crawler => 1.0,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Walker => 0,
            Self::Runner => 1,
            Self::Brute => 2,
            Self::Crawler => 3,
        }
    }

    /// A uniformly random kind.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for SeekerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Walker => "walker",
            Self::Runner => "runner",
            Self::Brute => "brute",
            Self::Crawler => "crawler",
        };
        f.write_str(name)
    }
}

/// World units per tick for each [`SeekerKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpeedTiers([i32; 4]);

impl SpeedTiers {
    #[inline]
    pub fn get(&self, kind: SeekerKind) -> i32 {
        self.0[kind.slot()]
    }

    pub fn as_array(&self) -> [i32; 4] {
        self.0
    }
}

/// The divisor of `tile_length` closest to `target`.
///
/// Candidates are `tile_length / x` for every `x` in `1..=max_x` that divides
/// it, visited from the largest down; on a tie the larger one wins.
fn nearest_divisor(tile_length: i32, max_x: i32, target: f64) -> i32 {
    let mut best = tile_length.max(1);
    let mut best_gap = f64::INFINITY;
    for x in 1..=max_x {
        if tile_length % x != 0 {
            continue;
        }
        let d = tile_length / x;
        let gap = (f64::from(d) - target).abs();
        if gap < best_gap {
            best = d;
            best_gap = gap;
        }
    }
    best
}

/// Survivor speed for a frame rate: the proper divisor of `tile_length`
/// closest to `240 / fps`.
pub fn base_speed(tile_length: i32, fps: u32) -> i32 {
    let target = 240.0 / f64::from(fps.max(1));
    nearest_divisor(tile_length, tile_length - 1, target)
}

/// Per-kind seeker speeds derived from the survivor's `speed`.
///
/// Each kind targets `speed / 4` times its factor (2, 3, 2, 1) and gets the
/// nearest divisor of `tile_length`, one included.
pub fn speed_tiers(speed: i32, tile_length: i32) -> SpeedTiers {
    let quarter = f64::from(speed) / 4.0;
    SpeedTiers(
        SeekerKind::ALL.map(|k| nearest_divisor(tile_length, tile_length, quarter * k.factor())),
    )
}
