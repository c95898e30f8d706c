//! Pathfinding for pursuers on a uniform tile grid.
//!
//! This crate provides the search side of the pursuit engine:
//!
//! - **Grid model** ([`TileGrid`]): row-major tiles with walkability, cardinal
//!   adjacency and row-wrap checks.
//! - **Cost model** ([`CostModel`]): uniform [`STEP_COST`] edges and a scaled
//!   Manhattan heuristic.
//! - **A\*** ([`Search`]): best-first search over a reusable [`SearchSpace`]
//!   that owns every piece of per-search scratch state.
//! - **Scheduling** ([`PathScheduler`]): runs searches on a background worker,
//!   never more than one at a time.
//!
//! The grid itself is immutable once built and can be shared freely between
//! threads behind an `Arc`.

mod astar;
mod cost;
mod frontier;
mod path;
mod scheduler;
mod tiles;

pub use astar::{
    Scratch, Search, SearchFlags, SearchOutcome, SearchRequest, SearchSpace, SearchState,
    SearchStatus,
};
pub use cost::{CostModel, STEP_COST, manhattan};
pub use frontier::Frontier;
pub use path::Path;
pub use scheduler::{PathScheduler, SchedulerError, SchedulerMode, SearchResult};
pub use tiles::{GridError, SolidRun, Tile, TileGrid};
