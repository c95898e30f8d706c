//! The pursuit system: every seeker in the level and the search scheduler
//! that feeds them routes.

use std::collections::BTreeMap;
use std::sync::Arc;

use horde_core::Point;
use horde_paths::{
    PathScheduler, SchedulerError, SchedulerMode, SearchFlags, SearchRequest, SearchResult,
    SearchStatus, TileGrid,
};
use log::{debug, error, warn};

use crate::effects::{Effect, Modifiers};
use crate::seeker::{Motion, RoutePolicy, Seeker, SeekerId};
use crate::speed::SeekerKind;

/// Counters accumulated over the lifetime of a [`Horde`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HordeStats {
    pub scheduled: u64,
    pub applied: u64,
    pub found: u64,
    pub unreachable: u64,
    /// Results for seekers that were removed while their search ran.
    pub stale: u64,
    /// Seekers disabled by an invariant violation.
    pub stalled: u64,
}

/// What happened during one [`Horde::update`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub moved: usize,
    pub arrived: usize,
    pub scheduled: usize,
    pub applied: usize,
}

pub struct Horde {
    grid: Arc<TileGrid>,
    scheduler: PathScheduler<SeekerId>,
    seekers: BTreeMap<SeekerId, Seeker>,
    policy: RoutePolicy,
    next_id: SeekerId,
    awaiting: Option<SeekerId>,
    stats: HordeStats,
}

impl Horde {
    pub fn new(
        grid: Arc<TileGrid>,
        mode: SchedulerMode,
        policy: RoutePolicy,
    ) -> Result<Self, SchedulerError> {
        let scheduler = PathScheduler::new(Arc::clone(&grid), mode)?;
        Ok(Self {
            grid,
            scheduler,
            seekers: BTreeMap::new(),
            policy,
            next_id: 0,
            awaiting: None,
            stats: HordeStats::default(),
        })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn policy(&self) -> RoutePolicy {
        self.policy
    }

    pub fn stats(&self) -> HordeStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.seekers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seekers.is_empty()
    }

    pub fn seekers(&self) -> impl Iterator<Item = &Seeker> {
        self.seekers.values()
    }

    pub fn seeker(&self, id: SeekerId) -> Option<&Seeker> {
        self.seekers.get(&id)
    }

    /// The seeker whose search is in flight.
    pub fn awaiting(&self) -> Option<SeekerId> {
        self.awaiting
    }

    /// Place a new seeker on `tile`. Returns `None` if the tile does not exist.
    pub fn spawn(&mut self, kind: SeekerKind, tile: usize, speed: i32) -> Option<SeekerId> {
        let pos = self.grid.pos(tile)?;
        let id = self.next_id;
        self.next_id += 1;
        self.seekers.insert(id, Seeker::new(id, kind, pos, speed));
        debug!("spawned {kind} seeker {id} on tile {tile}");
        Some(id)
    }

    /// Let seeker `id` route through walls. Returns `false` for unknown ids.
    pub fn set_wall_walker(&mut self, id: SeekerId, on: bool) -> bool {
        match self.seekers.get_mut(&id) {
            Some(seeker) => {
                seeker.set_walks_walls(on);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: SeekerId) -> Option<Seeker> {
        self.seekers.remove(&id)
    }

    /// Advance every seeker one tick toward `target`.
    ///
    /// A finished search is applied first. Then each seeker moves, and any
    /// seeker left without a tile to walk to gets a new search. Scheduling
    /// waits for the search before it, so a tick can block briefly.
    pub fn update(
        &mut self,
        target: Point,
        modifiers: &Modifiers,
    ) -> Result<UpdateReport, SchedulerError> {
        let mut report = UpdateReport::default();
        if let Some(result) = self.scheduler.poll()? {
            self.apply_result(result);
            report.applied += 1;
        }

        let frozen = modifiers.is_active(Effect::Freeze);
        let flags = modifiers.search_flags();
        let goal = self.grid.tile_at(target);
        let tile_size = self.grid.tile_size();
        let ids: Vec<SeekerId> = self.seekers.keys().copied().collect();

        for id in ids {
            let Some(seeker) = self.seekers.get_mut(&id) else {
                continue;
            };
            match seeker.advance(&self.grid, self.policy, frozen) {
                Ok(Motion::Moving(_)) => report.moved += 1,
                Ok(Motion::Arrived) => report.arrived += 1,
                Ok(_) => {}
                Err(err) => {
                    error!("{err}");
                    self.stats.stalled += 1;
                    continue;
                }
            }

            if self.awaiting == Some(id) || !seeker.needs_route(target, tile_size) {
                continue;
            }
            let (Some(start), Some(goal)) = (seeker.tile(&self.grid), goal) else {
                continue;
            };
            let mut seeker_flags = flags;
            if seeker.walks_walls() {
                seeker_flags |= SearchFlags::WALL_WALKER;
            }
            let request = SearchRequest::new(start, goal).with_flags(seeker_flags);
            if let Some(previous) = self.scheduler.schedule(id, request)? {
                self.apply_result(previous);
                report.applied += 1;
            }
            self.awaiting = Some(id);
            self.stats.scheduled += 1;
            report.scheduled += 1;
        }
        Ok(report)
    }

    /// Wait for the search in flight, if any, and apply it.
    pub fn flush(&mut self) -> Result<bool, SchedulerError> {
        match self.scheduler.join_pending()? {
            Some(result) => {
                self.apply_result(result);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply_result(&mut self, result: SearchResult<SeekerId>) {
        if self.awaiting == Some(result.key) {
            self.awaiting = None;
        }
        self.stats.applied += 1;
        match result.outcome.status {
            SearchStatus::Found => self.stats.found += 1,
            SearchStatus::Unreachable => self.stats.unreachable += 1,
            SearchStatus::AlreadyThere => {}
        }
        let Some(seeker) = self.seekers.get_mut(&result.key) else {
            warn!(
                "dropping search #{} for removed seeker {}",
                result.ticket, result.key
            );
            self.stats.stale += 1;
            return;
        };
        if let Err(err) = seeker.apply(result.outcome, &self.grid) {
            error!("{err}");
            self.stats.stalled += 1;
        }
    }
}
