//! Types shared by the pathfinding and game crates: integer geometry in world
//! units, cardinal [`Direction`]s and the parsed static map
//! ([`MapDescription`]).

pub mod geom;
pub mod map;

pub use geom::{Direction, Point, Range};
pub use map::{BLOCKED, MapDescription, MapError, SPAWN};
