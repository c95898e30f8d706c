//! Horde: real-time zombie pursuit on a tile grid, run headless.
//!
//! Seekers chase a wandering survivor. Each seeker asks for a route when it
//! runs out of tiles to walk, and routes are computed by `horde_paths` on a
//! background worker, one search at a time.

pub mod config;
pub mod effects;
pub mod horde;
pub mod seeker;
pub mod sim;
pub mod spawn;
pub mod speed;

pub use config::{ConfigError, Options};
pub use effects::{Effect, Modifiers};
pub use horde::{Horde, HordeStats, UpdateReport};
pub use seeker::{Motion, MotionError, RoutePolicy, Seeker, SeekerId};
pub use sim::{RunSummary, SimError, Simulation, TickReport};
pub use spawn::Spawner;
pub use speed::{SeekerKind, SpeedTiers, base_speed, speed_tiers};

/// The map shipped with the game.
pub const DEFAULT_MAP: &str = include_str!("../data/pacman.txt");
