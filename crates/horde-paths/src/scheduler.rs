//! Runs searches off the simulation thread, one at a time.
//!
//! The scheduler keeps at most one search in flight. Scheduling a new search
//! first waits for the previous one and hands its result back, so results
//! always come out in the order they were requested.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use thiserror::Error;

use crate::{SearchOutcome, SearchRequest, SearchSpace, TileGrid};

const WORKER_NAME: &str = "horde-pathfinder";

/// Where searches run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SchedulerMode {
    /// On a dedicated worker thread.
    #[default]
    Background,
    /// Synchronously inside [`PathScheduler::schedule`].
    Inline,
}

/// A finished search, tagged with the key it was scheduled for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult<K> {
    /// Position in scheduling order, starting at 0.
    pub ticket: u64,
    pub key: K,
    pub request: SearchRequest,
    pub outcome: SearchOutcome,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to start the pathfinder thread")]
    Spawn(#[source] io::Error),
    #[error("the pathfinder thread stopped unexpectedly")]
    WorkerLost,
}

struct Job<K> {
    ticket: u64,
    key: K,
    request: SearchRequest,
}

enum Engine<K> {
    Background {
        jobs: Option<SyncSender<Job<K>>>,
        results: Receiver<SearchResult<K>>,
        handle: Option<JoinHandle<()>>,
    },
    Inline {
        grid: Arc<TileGrid>,
        space: SearchSpace,
        ready: VecDeque<SearchResult<K>>,
    },
}

/// Serialises searches for keys of type `K`.
pub struct PathScheduler<K> {
    engine: Engine<K>,
    next_ticket: u64,
    in_flight: Option<u64>,
    /// A joined result that `schedule` could not hand back.
    unclaimed: Option<SearchResult<K>>,
}

impl<K: Send + 'static> PathScheduler<K> {
    pub fn new(grid: Arc<TileGrid>, mode: SchedulerMode) -> Result<Self, SchedulerError> {
        let engine = match mode {
            SchedulerMode::Background => {
                let (job_tx, job_rx) = mpsc::sync_channel(1);
                let (result_tx, result_rx) = mpsc::channel();
                let handle = thread::Builder::new()
                    .name(WORKER_NAME.into())
                    .spawn(move || worker(grid, job_rx, result_tx))
                    .map_err(SchedulerError::Spawn)?;
                Engine::Background {
                    jobs: Some(job_tx),
                    results: result_rx,
                    handle: Some(handle),
                }
            }
            SchedulerMode::Inline => Engine::Inline {
                space: SearchSpace::new(grid.len()),
                grid,
                ready: VecDeque::with_capacity(1),
            },
        };
        Ok(Self {
            engine,
            next_ticket: 0,
            in_flight: None,
            unclaimed: None,
        })
    }

    pub fn mode(&self) -> SchedulerMode {
        match self.engine {
            Engine::Background { .. } => SchedulerMode::Background,
            Engine::Inline { .. } => SchedulerMode::Inline,
        }
    }

    /// Whether a search has been scheduled and its result not yet collected.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.unclaimed.is_some()
    }

    /// Start a search for `key`.
    ///
    /// If a search is already in flight this blocks until it finishes and
    /// returns its result, which the caller must apply before the new one
    /// arrives. If the new search cannot be started, that result is kept
    /// for the next [`poll`](Self::poll) or [`join_pending`](Self::join_pending).
    pub fn schedule(
        &mut self,
        key: K,
        request: SearchRequest,
    ) -> Result<Option<SearchResult<K>>, SchedulerError> {
        let previous = self.join_pending()?;
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let job = Job {
            ticket,
            key,
            request,
        };
        match &mut self.engine {
            Engine::Background { jobs, .. } => {
                let sent = jobs.as_ref().is_some_and(|sender| sender.send(job).is_ok());
                if !sent {
                    self.unclaimed = previous;
                    return Err(SchedulerError::WorkerLost);
                }
            }
            Engine::Inline { grid, space, ready } => ready.push_back(run_job(grid, space, job)),
        }
        debug!(
            "scheduled search #{ticket}: {} -> {}",
            request.start, request.goal
        );
        self.in_flight = Some(ticket);
        Ok(previous)
    }

    /// The finished result of the search in flight, without blocking.
    pub fn poll(&mut self) -> Result<Option<SearchResult<K>>, SchedulerError> {
        if let Some(result) = self.unclaimed.take() {
            return Ok(Some(result));
        }
        if self.in_flight.is_none() {
            return Ok(None);
        }
        let result = match &mut self.engine {
            Engine::Background { results, .. } => match results.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return Err(SchedulerError::WorkerLost),
            },
            Engine::Inline { ready, .. } => ready.pop_front(),
        };
        if result.is_some() {
            self.in_flight = None;
        }
        Ok(result)
    }

    /// Block until the search in flight finishes and return its result.
    pub fn join_pending(&mut self) -> Result<Option<SearchResult<K>>, SchedulerError> {
        if let Some(result) = self.unclaimed.take() {
            return Ok(Some(result));
        }
        let Some(ticket) = self.in_flight else {
            return Ok(None);
        };
        let result = match &mut self.engine {
            Engine::Background { results, .. } => {
                results.recv().map_err(|_| SchedulerError::WorkerLost)?
            }
            Engine::Inline { ready, .. } => ready.pop_front().ok_or(SchedulerError::WorkerLost)?,
        };
        if result.ticket != ticket {
            warn!(
                "expected result #{ticket}, worker returned #{}",
                result.ticket
            );
        }
        self.in_flight = None;
        Ok(Some(result))
    }
}

impl<K> Drop for PathScheduler<K> {
    fn drop(&mut self) {
        if let Engine::Background { jobs, handle, .. } = &mut self.engine {
            // Closing the job channel ends the worker loop.
            drop(jobs.take());
            if let Some(handle) = handle.take() {
                if handle.join().is_err() {
                    warn!("{WORKER_NAME} panicked");
                }
            }
        }
    }
}

fn run_job<K>(grid: &TileGrid, space: &mut SearchSpace, job: Job<K>) -> SearchResult<K> {
    let outcome = space.solve(grid, job.request);
    debug!(
        "search #{} finished: {:?}, {} steps, {} expanded",
        job.ticket,
        outcome.status,
        outcome.path.len(),
        outcome.expanded
    );
    SearchResult {
        ticket: job.ticket,
        key: job.key,
        request: job.request,
        outcome,
    }
}

fn worker<K>(grid: Arc<TileGrid>, jobs: Receiver<Job<K>>, results: mpsc::Sender<SearchResult<K>>) {
    let mut space = SearchSpace::new(grid.len());
    for job in jobs {
        if results.send(run_job(&grid, &mut space, job)).is_err() {
            break;
        }
    }
    debug!("{WORKER_NAME} exiting");
}
