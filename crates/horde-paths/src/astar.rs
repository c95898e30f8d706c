//! A* search over a [`TileGrid`].
//!
//! A [`Search`] borrows the grid immutably and a [`SearchSpace`] mutably. The
//! space holds every piece of per-search state (scratch costs, closed set and
//! frontier), so two searches over the same grid never share mutable data.

use std::ops::{BitOr, BitOrAssign};

use log::{error, trace, warn};

use crate::{CostModel, Frontier, Path, TileGrid};

/// Options that change how a search treats walls.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchFlags(pub u8);

impl SearchFlags {
    pub const NONE: Self = Self(0);
    /// The target may stand inside a wall: search toward the nearest
    /// walkable tile instead.
    pub const THROUGH_WALLS: Self = Self(1 << 0);
    /// Blocked tiles are passable for this seeker.
    pub const WALL_WALKER: Self = Self(1 << 1);

    /// Whether this set contains all the bits from `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SearchFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SearchFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Start and goal tiles of one search, captured when it is scheduled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub start: usize,
    pub goal: usize,
    pub flags: SearchFlags,
}

impl SearchRequest {
    pub const fn new(start: usize, goal: usize) -> Self {
        Self {
            start,
            goal,
            flags: SearchFlags::NONE,
        }
    }

    pub const fn with_flags(self, flags: SearchFlags) -> Self {
        Self { flags, ..self }
    }
}

/// Per-tile search bookkeeping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Scratch {
    /// Cost of the best known path from the start.
    pub g: i32,
    /// Heuristic estimate to the goal.
    pub h: i32,
    /// `g + h`.
    pub f: i32,
    /// Predecessor on the best known path.
    pub parent: Option<usize>,
}

/// Reusable state for searches over grids of one size.
///
/// [`Search::new`] resets the space, so a space can be handed from one search
/// to the next without any cleanup by the caller.
#[derive(Clone, Debug, Default)]
pub struct SearchSpace {
    scratch: Vec<Scratch>,
    closed: Vec<bool>,
    frontier: Frontier,
}

impl SearchSpace {
    pub fn new(len: usize) -> Self {
        let mut space = Self::default();
        space.reset(len);
        space
    }

    /// Clear all state and size the space for `len` tiles.
    pub fn reset(&mut self, len: usize) {
        self.scratch.clear();
        self.scratch.resize(len, Scratch::default());
        self.closed.clear();
        self.closed.resize(len, false);
        self.frontier.reset(len);
    }

    /// Number of tiles the space is sized for.
    pub fn len(&self) -> usize {
        self.scratch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scratch.is_empty()
    }

    /// Bookkeeping of tile `index` from the latest search.
    pub fn scratch(&self, index: usize) -> Option<&Scratch> {
        self.scratch.get(index)
    }

    /// Whether tile `index` was expanded by the latest search.
    pub fn is_closed(&self, index: usize) -> bool {
        self.closed.get(index).copied().unwrap_or(false)
    }

    /// Tiles still queued when the latest search stopped.
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Run a complete search for `request` on `grid`.
    pub fn solve(&mut self, grid: &TileGrid, request: SearchRequest) -> SearchOutcome {
        Search::new(grid, self, request).run()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchState {
    Running,
    Done,
}

/// How a search ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStatus {
    /// A path to the goal was found.
    Found,
    /// The start already is the goal; nothing to walk.
    AlreadyThere,
    /// No path exists, or the request was out of range.
    Unreachable,
}

/// Result of a finished search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    /// Tiles to walk, stored goal first and excluding the start. Empty
    /// unless `status` is `Found`.
    pub path: Path,
    /// The goal actually searched for, after any remapping.
    pub goal: usize,
    /// Number of tiles expanded.
    pub expanded: usize,
}

impl SearchOutcome {
    #[inline]
    pub fn is_found(&self) -> bool {
        self.status == SearchStatus::Found
    }
}

/// One A* search in progress.
#[derive(Debug)]
pub struct Search<'a> {
    grid: &'a TileGrid,
    space: &'a mut SearchSpace,
    cost: CostModel,
    start: usize,
    goal: usize,
    flags: SearchFlags,
    state: SearchState,
    status: SearchStatus,
    expanded: usize,
}

impl<'a> Search<'a> {
    /// Prepare a search, resetting `space` for `grid`.
    ///
    /// Trivial requests are settled here and the search starts out `Done`:
    /// out-of-range tiles, a start equal to the goal, and (with
    /// [`SearchFlags::THROUGH_WALLS`]) a goal whose nearest walkable tile is
    /// the start.
    pub fn new(grid: &'a TileGrid, space: &'a mut SearchSpace, request: SearchRequest) -> Self {
        space.reset(grid.len());
        let mut search = Self {
            grid,
            space,
            cost: CostModel::for_grid(grid),
            start: request.start,
            goal: request.goal,
            flags: request.flags,
            state: SearchState::Running,
            status: SearchStatus::Unreachable,
            expanded: 0,
        };

        if request.start >= grid.len() || request.goal >= grid.len() {
            warn!(
                "search request {} -> {} outside grid of {} tiles",
                request.start,
                request.goal,
                grid.len()
            );
            search.state = SearchState::Done;
            return search;
        }

        if request.flags.contains(SearchFlags::THROUGH_WALLS) {
            match grid.nearest_walkable(request.goal) {
                Some(goal) => search.goal = goal,
                None => {
                    search.state = SearchState::Done;
                    return search;
                }
            }
        }

        if search.goal == search.start {
            search.status = SearchStatus::AlreadyThere;
            search.state = SearchState::Done;
            return search;
        }

        let h = search.heuristic(search.start);
        search.space.scratch[search.start] = Scratch {
            g: 0,
            h,
            f: h,
            parent: None,
        };
        search.space.frontier.push(search.start, 0);
        search
    }

    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// The goal being searched for, after any remapping.
    #[inline]
    pub fn goal(&self) -> usize {
        self.goal
    }

    /// Tiles expanded so far.
    #[inline]
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Heuristic cost from tile `index` to the goal.
    pub fn heuristic(&self, index: usize) -> i32 {
        match (self.grid.pos(index), self.grid.pos(self.goal)) {
            (Some(from), Some(goal)) => self.cost.estimate(from, goal),
            _ => 0,
        }
    }

    fn passable(&self, index: usize) -> bool {
        self.flags.contains(SearchFlags::WALL_WALKER) || self.grid.is_walkable(index)
    }

    /// Run one iteration: expand the best queued tile.
    pub fn step(&mut self) -> SearchState {
        if self.state == SearchState::Done {
            return self.state;
        }
        let Some((_, current)) = self.space.frontier.pop() else {
            return self.finish(SearchStatus::Unreachable);
        };
        if current == self.goal {
            return self.finish(SearchStatus::Found);
        }

        self.space.closed[current] = true;
        self.expanded += 1;
        let tentative = self.space.scratch[current].g + self.cost.step_cost();

        let grid = self.grid;
        for next in grid.neighbors(current) {
            if self.space.closed[next] || !self.passable(next) {
                continue;
            }
            if self.space.frontier.contains(next) && tentative >= self.space.scratch[next].g {
                continue;
            }
            let h = self.heuristic(next);
            self.space.scratch[next] = Scratch {
                g: tentative,
                h,
                f: tentative + h,
                parent: Some(current),
            };
            self.space.frontier.push(next, tentative + h);
        }
        SearchState::Running
    }

    fn finish(&mut self, status: SearchStatus) -> SearchState {
        trace!(
            "search {} -> {}: {:?} after {} expansions",
            self.start, self.goal, status, self.expanded
        );
        self.status = status;
        self.state = SearchState::Done;
        self.state
    }

    /// Step until done and return the outcome.
    pub fn run(mut self) -> SearchOutcome {
        while self.step() == SearchState::Running {}
        self.outcome()
    }

    fn outcome(&self) -> SearchOutcome {
        let (status, path) = match self.status {
            SearchStatus::Found => match self.reconstruct() {
                Some(path) => (SearchStatus::Found, path),
                None => (SearchStatus::Unreachable, Path::default()),
            },
            status => (status, Path::default()),
        };
        SearchOutcome {
            status,
            path,
            goal: self.goal,
            expanded: self.expanded,
        }
    }

    /// Walk parent links from the goal back to the start.
    fn reconstruct(&self) -> Option<Path> {
        let limit = self.grid.len();
        let mut cells = Vec::new();
        let mut at = self.goal;
        while at != self.start {
            debug_assert!(cells.len() < limit, "parent chain longer than the grid");
            if cells.len() >= limit {
                error!(
                    "parent chain from {} does not reach {} within {} tiles",
                    self.goal, self.start, limit
                );
                return None;
            }
            cells.push(at);
            match self.space.scratch[at].parent {
                Some(parent) => at = parent,
                None => break,
            }
        }
        Some(Path::from_goal_first(cells))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    const MAZE: &str = "\
.......
.#####.
.#...#.
.#.#.#.
...#...";

    const SPLIT: &str = "\
..#..
..#..
..#..";

    fn tile_distance(grid: &TileGrid, a: usize, b: usize) -> usize {
        let w = grid.width();
        (a % w).abs_diff(b % w) + (a / w).abs_diff(b / w)
    }

    fn bfs_len(grid: &TileGrid, start: usize, goal: usize) -> Option<usize> {
        let mut dist = vec![usize::MAX; grid.len()];
        let mut queue = VecDeque::from([start]);
        dist[start] = 0;
        while let Some(at) = queue.pop_front() {
            if at == goal {
                return Some(dist[at]);
            }
            for n in grid.neighbors(at) {
                if grid.is_walkable(n) && dist[n] == usize::MAX {
                    dist[n] = dist[at] + 1;
                    queue.push_back(n);
                }
            }
        }
        None
    }

    fn assert_connected(grid: &TileGrid, start: usize, outcome: &SearchOutcome) {
        let mut prev = start;
        for cell in outcome.path.iter_from_start() {
            assert!(
                grid.neighbors(prev).any(|n| n == cell),
                "{prev} -> {cell} is not a step"
            );
            prev = cell;
        }
        assert_eq!(prev, outcome.goal);
    }

    #[test]
    fn open_grid_paths_have_manhattan_length() {
        let grid = TileGrid::open(6, 4, 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        for start in 0..grid.len() {
            for goal in 0..grid.len() {
                let out = space.solve(&grid, SearchRequest::new(start, goal));
                if start == goal {
                    assert_eq!(out.status, SearchStatus::AlreadyThere);
                    continue;
                }
                assert!(out.is_found());
                assert_eq!(out.path.len(), tile_distance(&grid, start, goal));
                assert_connected(&grid, start, &out);
            }
        }
    }

    #[test]
    fn five_by_five_corner_to_corner() {
        let grid = TileGrid::open(5, 5, 24).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let search = Search::new(&grid, &mut space, SearchRequest::new(0, 24));
        assert_eq!(search.heuristic(0), 80);
        assert_eq!(search.state(), SearchState::Running);
        let out = search.run();
        assert_eq!(out.status, SearchStatus::Found);
        assert_eq!(out.path.len(), 8);
        assert_eq!(out.path.goal(), Some(24));
        assert!(matches!(out.path.next_step(), Some(1) | Some(5)));
        assert_eq!(space.scratch(24).map(|s| s.g), Some(80));
    }

    #[test]
    fn largest_accepted_tiles_search_without_overflow() {
        let grid = TileGrid::open(7, 1, 26_843_544).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let search = Search::new(&grid, &mut space, SearchRequest::new(0, 6));
        assert_eq!(search.heuristic(0), 60);
        let out = search.run();
        assert_eq!(out.status, SearchStatus::Found);
        assert_eq!(out.path.len(), 6);
        assert_eq!(space.scratch(6).map(|s| s.f), Some(60));
    }

    #[test]
    fn start_equals_goal_does_no_work() {
        let grid = TileGrid::open(5, 5, 24).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let mut search = Search::new(&grid, &mut space, SearchRequest::new(12, 12));
        assert_eq!(search.state(), SearchState::Done);
        assert_eq!(search.step(), SearchState::Done);
        let out = search.run();
        assert_eq!(out.status, SearchStatus::AlreadyThere);
        assert!(out.path.is_empty());
        assert_eq!(out.expanded, 0);
    }

    #[test]
    fn walled_off_goal_is_unreachable_every_time() {
        let grid = TileGrid::parse(SPLIT, 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let first = space.solve(&grid, SearchRequest::new(0, 4));
        assert_eq!(first.status, SearchStatus::Unreachable);
        assert!(first.path.is_empty());
        // Both open cells of each row on the left side are explored.
        assert_eq!(first.expanded, 6);
        for _ in 0..5 {
            assert_eq!(space.solve(&grid, SearchRequest::new(0, 4)), first);
        }
        assert_eq!(space.len(), grid.len());
    }

    #[test]
    fn paths_are_shortest_around_walls() {
        let grid = TileGrid::parse(MAZE, 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let open: Vec<usize> = grid.walkable_indices().collect();
        for &start in &open {
            for &goal in &open {
                let out = space.solve(&grid, SearchRequest::new(start, goal));
                match bfs_len(&grid, start, goal) {
                    Some(0) => assert_eq!(out.status, SearchStatus::AlreadyThere),
                    Some(len) => {
                        assert!(out.is_found(), "{start} -> {goal}");
                        assert_eq!(out.path.len(), len, "{start} -> {goal}");
                        assert_connected(&grid, start, &out);
                    }
                    None => assert_eq!(out.status, SearchStatus::Unreachable),
                }
            }
        }
    }

    #[test]
    fn independent_runs_agree() {
        let grid = TileGrid::parse(MAZE, 12).unwrap();
        let request = SearchRequest::new(16, 34);
        let a = SearchSpace::new(grid.len()).solve(&grid, request);
        let b = SearchSpace::new(grid.len()).solve(&grid, request);
        assert!(a.is_found());
        assert_eq!(a, b);
    }

    #[test]
    fn back_to_back_searches_do_not_leak_state() {
        let grid = TileGrid::parse(MAZE, 12).unwrap();
        let mut shared = SearchSpace::new(grid.len());
        let _ = shared.solve(&grid, SearchRequest::new(0, 34));
        let second = shared.solve(&grid, SearchRequest::new(34, 16));
        let fresh = SearchSpace::new(grid.len()).solve(&grid, SearchRequest::new(34, 16));
        assert_eq!(second, fresh);
        // Tiles the second search never touched carry no leftover parents.
        for i in 0..grid.len() {
            let s = shared.scratch(i).unwrap();
            if !shared.is_closed(i) && !shared.frontier().contains(i) && i != 16 {
                assert_eq!(*s, Scratch::default(), "tile {i}");
            }
        }
    }

    #[test]
    fn through_walls_remaps_goal_to_nearest_walkable() {
        let grid = TileGrid::parse("#####\n#...#\n#.#.#\n#...#\n#####", 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let request = SearchRequest::new(18, 12).with_flags(SearchFlags::THROUGH_WALLS);
        let out = space.solve(&grid, request);
        assert_eq!(out.goal, 7);
        assert!(out.is_found());
        assert_eq!(out.path.len(), 3);
        assert!(grid.is_walkable(out.goal));

        // Without the flag the wall tile cannot be reached at all.
        let blocked = space.solve(&grid, SearchRequest::new(18, 12));
        assert_eq!(blocked.status, SearchStatus::Unreachable);
    }

    #[test]
    fn through_walls_remap_onto_start_holds() {
        let grid = TileGrid::parse("#####\n#...#\n#.#.#\n#...#\n#####", 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let request = SearchRequest::new(7, 12).with_flags(SearchFlags::THROUGH_WALLS);
        let out = space.solve(&grid, request);
        assert_eq!(out.status, SearchStatus::AlreadyThere);
        assert_eq!(out.expanded, 0);
    }

    #[test]
    fn wall_walker_crosses_blocked_tiles() {
        let grid = TileGrid::parse(SPLIT, 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let request = SearchRequest::new(5, 9).with_flags(SearchFlags::WALL_WALKER);
        let out = space.solve(&grid, request);
        assert!(out.is_found());
        assert_eq!(out.path.len(), 4);
        assert!(out.path.cells().iter().any(|&c| !grid.is_walkable(c)));
    }

    #[test]
    fn out_of_range_request_is_unreachable() {
        let grid = TileGrid::open(3, 3, 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let out = space.solve(&grid, SearchRequest::new(0, 9));
        assert_eq!(out.status, SearchStatus::Unreachable);
        assert_eq!(out.expanded, 0);
        let out = space.solve(&grid, SearchRequest::new(42, 0));
        assert_eq!(out.status, SearchStatus::Unreachable);
    }

    #[test]
    fn relaxation_requires_strict_improvement() {
        // Two equal-cost routes into tile 4: the first parent to reach it
        // (through the lower index) is kept.
        let grid = TileGrid::open(3, 3, 12).unwrap();
        let mut space = SearchSpace::new(grid.len());
        let out = space.solve(&grid, SearchRequest::new(0, 4));
        assert!(out.is_found());
        assert_eq!(space.scratch(4).and_then(|s| s.parent), Some(1));
        assert_eq!(out.path.iter_from_start().collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn flags_combine() {
        let both = SearchFlags::THROUGH_WALLS | SearchFlags::WALL_WALKER;
        assert!(both.contains(SearchFlags::THROUGH_WALLS));
        assert!(both.contains(SearchFlags::WALL_WALKER));
        assert!(!SearchFlags::NONE.contains(SearchFlags::WALL_WALKER));
        let mut flags = SearchFlags::NONE;
        assert!(flags.is_empty());
        flags |= SearchFlags::WALL_WALKER;
        assert_eq!(flags, SearchFlags::WALL_WALKER);
    }
}
