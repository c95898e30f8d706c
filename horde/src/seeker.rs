//! Seekers: pursuers that turn search results into tile-by-tile motion.

use horde_core::{Direction, Point};
use horde_paths::{Path, SearchOutcome, SearchStatus, TileGrid};
use log::{debug, error};
use serde::Deserialize;
use thiserror::Error;

use crate::speed::SeekerKind;

pub type SeekerId = u32;

/// What a seeker does with the rest of a path after its first step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePolicy {
    /// Search again after every tile.
    #[default]
    Replan,
    /// Walk the whole path before searching again.
    Follow,
}

/// Result of one movement update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Motion {
    /// No target tile and nothing queued.
    Idle,
    /// Moved one step toward the target tile.
    Moving(Direction),
    /// Reached the target tile, or was already at the goal.
    Arrived,
    /// No path exists; waiting for the next search.
    Holding,
    /// Movement suspended by an effect.
    Frozen,
    /// Disabled after an invariant violation.
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MotionError {
    #[error("seeker {id}: step from {from} to {to} is not cardinal")]
    NonCardinal { id: SeekerId, from: Point, to: Point },
    #[error("seeker {id}: path tile {tile} is outside the grid")]
    UnknownTile { id: SeekerId, tile: usize },
}

#[derive(Clone, Debug)]
pub struct Seeker {
    id: SeekerId,
    kind: SeekerKind,
    pos: Point,
    to: Option<Point>,
    vel: Point,
    speed: i32,
    heading: Direction,
    route: Path,
    trail: Vec<usize>,
    walks_walls: bool,
    stalled: bool,
}

impl Seeker {
    pub fn new(id: SeekerId, kind: SeekerKind, pos: Point, speed: i32) -> Self {
        Self {
            id,
            kind,
            pos,
            to: None,
            vel: Point::ZERO,
            speed: speed.max(1),
            heading: Direction::West,
            route: Path::default(),
            trail: Vec::new(),
            walks_walls: false,
            stalled: false,
        }
    }

    #[inline]
    pub fn id(&self) -> SeekerId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> SeekerKind {
        self.kind
    }

    /// Top-left corner in world units.
    #[inline]
    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Position of the tile being walked to.
    #[inline]
    pub fn target(&self) -> Option<Point> {
        self.to
    }

    #[inline]
    pub fn vel(&self) -> Point {
        self.vel
    }

    #[inline]
    pub fn speed(&self) -> i32 {
        self.speed
    }

    #[inline]
    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// Tiles still queued after the current target.
    pub fn route(&self) -> &Path {
        &self.route
    }

    /// The last full path found, start side first.
    pub fn trail(&self) -> &[usize] {
        &self.trail
    }

    /// Whether routes for this seeker may cross blocked tiles.
    pub fn walks_walls(&self) -> bool {
        self.walks_walls
    }

    pub fn set_walks_walls(&mut self, on: bool) {
        self.walks_walls = on;
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Tile under the seeker's top-left corner.
    pub fn tile(&self, grid: &TileGrid) -> Option<usize> {
        grid.tile_at(self.pos)
    }

    /// Whether a new search should be started toward `target`: the seeker
    /// has no tile to walk to and is more than one tile away.
    pub fn needs_route(&self, target: Point, tile_size: i32) -> bool {
        let reach = i64::from(tile_size);
        !self.stalled && self.to.is_none() && self.pos.distance_sq(target) > reach * reach
    }

    /// Walk toward the tile at `next`, which must lie in a straight
    /// cardinal line from the current position.
    pub fn set_target(&mut self, next: Point) -> Result<(), MotionError> {
        let direction = Direction::from_delta(next - self.pos);
        debug_assert!(
            direction.is_some(),
            "non-cardinal step for seeker {}: {} -> {}",
            self.id,
            self.pos,
            next
        );
        let Some(direction) = direction else {
            let err = MotionError::NonCardinal {
                id: self.id,
                from: self.pos,
                to: next,
            };
            error!("{err}");
            self.stall();
            return Err(err);
        };
        self.to = Some(next);
        self.heading = direction;
        self.vel = direction.offset() * self.speed;
        Ok(())
    }

    fn stall(&mut self) {
        self.stalled = true;
        self.to = None;
        self.vel = Point::ZERO;
        self.route.clear();
    }

    /// One movement tick.
    pub fn advance(
        &mut self,
        grid: &TileGrid,
        policy: RoutePolicy,
        frozen: bool,
    ) -> Result<Motion, MotionError> {
        if self.stalled {
            return Ok(Motion::Stalled);
        }
        let Some(to) = self.to else {
            return Ok(Motion::Idle);
        };
        if frozen {
            return Ok(Motion::Frozen);
        }
        if self.pos != to {
            let remaining = to - self.pos;
            if remaining.x.abs() + remaining.y.abs() <= self.speed {
                self.pos = to;
            } else {
                self.pos += self.vel;
            }
            return Ok(Motion::Moving(self.heading));
        }

        self.to = None;
        self.vel = Point::ZERO;
        if policy == RoutePolicy::Follow {
            if let Some(next) = self.route.pop_next() {
                self.target_tile(grid, next)?;
            }
        }
        Ok(Motion::Arrived)
    }

    fn target_tile(&mut self, grid: &TileGrid, tile: usize) -> Result<(), MotionError> {
        match grid.pos(tile) {
            Some(pos) => self.set_target(pos),
            None => {
                let err = MotionError::UnknownTile { id: self.id, tile };
                error!("{err}");
                self.stall();
                Err(err)
            }
        }
    }

    /// Take over the result of a finished search.
    pub fn apply(
        &mut self,
        outcome: SearchOutcome,
        grid: &TileGrid,
    ) -> Result<Motion, MotionError> {
        if self.stalled {
            return Ok(Motion::Stalled);
        }
        match outcome.status {
            SearchStatus::Found => {
                let mut path = outcome.path;
                self.trail = path.iter_from_start().collect();
                let Some(next) = path.pop_next() else {
                    self.route.clear();
                    return Ok(Motion::Holding);
                };
                self.target_tile(grid, next)?;
                self.route = path;
                debug!(
                    "seeker {} heads {} toward tile {}, {} more queued",
                    self.id,
                    self.heading,
                    next,
                    self.route.len()
                );
                Ok(Motion::Moving(self.heading))
            }
            SearchStatus::AlreadyThere => {
                self.route.clear();
                Ok(Motion::Arrived)
            }
            SearchStatus::Unreachable => {
                self.route.clear();
                self.trail.clear();
                Ok(Motion::Holding)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use horde_paths::{SearchRequest, SearchSpace};

    use super::*;

    const TS: i32 = 24;

    fn grid() -> TileGrid {
        TileGrid::open(5, 5, TS).unwrap()
    }

    fn walk_until_arrived(seeker: &mut Seeker, grid: &TileGrid, policy: RoutePolicy) -> usize {
        let mut ticks = 0;
        loop {
            ticks += 1;
            if seeker.advance(grid, policy, false).unwrap() == Motion::Arrived {
                return ticks;
            }
            assert!(ticks < 1000, "never arrived");
        }
    }

    #[test]
    fn steps_land_on_the_target_tile() {
        let grid = grid();
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 3);
        s.set_target(Point::new(TS, 0)).unwrap();
        assert_eq!(s.vel(), Point::new(3, 0));
        assert_eq!(s.heading(), Direction::East);
        // Eight steps of 3 cover one tile; the ninth tick clears the target.
        assert_eq!(walk_until_arrived(&mut s, &grid, RoutePolicy::Replan), 9);
        assert_eq!(s.pos(), Point::new(TS, 0));
        assert_eq!(s.target(), None);
    }

    #[test]
    fn idle_without_target() {
        let grid = grid();
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 2);
        assert_eq!(s.advance(&grid, RoutePolicy::Replan, false), Ok(Motion::Idle));
    }

    #[test]
    fn frozen_seekers_keep_their_position() {
        let grid = grid();
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 2);
        s.set_target(Point::new(0, TS)).unwrap();
        for _ in 0..10 {
            assert_eq!(s.advance(&grid, RoutePolicy::Replan, true), Ok(Motion::Frozen));
        }
        assert_eq!(s.pos(), Point::ZERO);
        assert_eq!(
            s.advance(&grid, RoutePolicy::Replan, false),
            Ok(Motion::Moving(Direction::South))
        );
    }

    #[test]
    fn needs_route_beyond_one_tile() {
        let s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 2);
        assert!(!s.needs_route(Point::new(TS, 0), TS));
        assert!(s.needs_route(Point::new(TS, 1), TS));
        assert!(s.needs_route(Point::new(2 * TS, 0), TS));
        let mut moving = s.clone();
        moving.set_target(Point::new(TS, 0)).unwrap();
        assert!(!moving.needs_route(Point::new(4 * TS, 0), TS));
    }

    #[test]
    fn found_outcome_targets_first_step() {
        let grid = grid();
        let mut space = SearchSpace::new(grid.len());
        let outcome = space.solve(&grid, SearchRequest::new(0, 24));
        let mut s = Seeker::new(1, SeekerKind::Runner, Point::ZERO, 3);
        let motion = s.apply(outcome, &grid).unwrap();
        assert!(matches!(motion, Motion::Moving(Direction::East | Direction::South)));
        assert_eq!(s.trail().len(), 8);
        assert_eq!(s.trail().last(), Some(&24));
        assert_eq!(s.route().len(), 7);
        assert_eq!(grid.pos(s.trail()[0]), s.target());
    }

    #[test]
    fn follow_policy_walks_the_whole_route() {
        let grid = grid();
        let mut space = SearchSpace::new(grid.len());
        let outcome = space.solve(&grid, SearchRequest::new(0, 24));
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 4);
        s.apply(outcome, &grid).unwrap();
        for _ in 0..8 {
            walk_until_arrived(&mut s, &grid, RoutePolicy::Follow);
        }
        assert_eq!(s.pos(), grid.pos(24).unwrap());
        assert_eq!(s.target(), None);
        assert!(s.route().is_empty());
    }

    #[test]
    fn replan_policy_stops_after_one_tile() {
        let grid = grid();
        let mut space = SearchSpace::new(grid.len());
        let outcome = space.solve(&grid, SearchRequest::new(0, 24));
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 4);
        s.apply(outcome, &grid).unwrap();
        walk_until_arrived(&mut s, &grid, RoutePolicy::Replan);
        assert_eq!(s.target(), None);
        assert_eq!(s.route().len(), 7);
        assert!(s.needs_route(grid.pos(24).unwrap(), TS));
    }

    #[test]
    fn already_there_reports_arrived() {
        let grid = grid();
        let mut space = SearchSpace::new(grid.len());
        let outcome = space.solve(&grid, SearchRequest::new(12, 12));
        let mut s = Seeker::new(1, SeekerKind::Walker, grid.pos(12).unwrap(), 2);
        assert_eq!(s.apply(outcome, &grid), Ok(Motion::Arrived));
        assert_eq!(s.target(), None);
    }

    #[test]
    fn unreachable_holds_and_clears_route() {
        let grid = TileGrid::parse("..#..\n..#..", TS).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let outcome = space.solve(&grid, SearchRequest::new(0, 4));
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 2);
        assert_eq!(s.apply(outcome, &grid), Ok(Motion::Holding));
        assert!(s.trail().is_empty());
        assert!(s.route().is_empty());
        assert!(s.needs_route(grid.pos(4).unwrap(), TS));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "non-cardinal")]
    fn diagonal_target_asserts_in_debug() {
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 2);
        let _ = s.set_target(Point::new(TS, TS));
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn diagonal_target_stalls_in_release() {
        let grid = grid();
        let mut s = Seeker::new(1, SeekerKind::Walker, Point::ZERO, 2);
        let err = s.set_target(Point::new(TS, TS)).unwrap_err();
        assert!(matches!(err, MotionError::NonCardinal { id: 1, .. }));
        assert!(s.is_stalled());
        assert_eq!(s.advance(&grid, RoutePolicy::Replan, false), Ok(Motion::Stalled));
        assert!(!s.needs_route(Point::new(4 * TS, 0), TS));
    }
}
