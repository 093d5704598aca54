/*
Sync Scheduler

Drives the periodic notification fetch. On activation it requests one initial
fetch, then one fetch per poll interval while the host is online. Offline ticks
are skipped outright; when connectivity returns the scheduler can issue a single
catch-up fetch instead of waiting for the next tick.

Every fetch gets a ticket from the handler at issuance time. Tickets carry the
activation generation and a strictly increasing sequence number, and the
FetchSequencer only admits a response whose ticket is newer than the last one
applied. Cancelling the scheduler aborts its task together with every fetch it
spawned.
*/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::service::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};

/// Why a fetch was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First fetch of an activation; resolves the loading state
    Initial,
    /// Regular interval tick
    Scheduled,
    /// Connectivity just came back
    CatchUp,
    /// Requested explicitly by the user
    Manual,
}

/// Identity of one fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub seq: u64,
    pub kind: FetchKind,
}

/// Generation and sequence bookkeeping for fetch responses
#[derive(Debug, Default)]
pub struct FetchSequencer {
    generation: u64,
    active: bool,
    next_seq: u64,
    last_applied: u64,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new activation, invalidating every earlier ticket
    pub fn activate(&mut self) -> u64 {
        self.generation += 1;
        self.active = true;
        self.next_seq = 0;
        self.last_applied = 0;
        self.generation
    }

    /// End the current activation; outstanding tickets become stale
    pub fn deactivate(&mut self) {
        if self.active {
            self.generation += 1;
            self.active = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Sequence number of the most recently issued ticket
    pub fn last_issued(&self) -> u64 {
        self.next_seq
    }

    /// Allocate the next ticket. `None` when no activation is running.
    pub fn issue(&mut self, kind: FetchKind) -> Option<FetchTicket> {
        if !self.active {
            return None;
        }
        self.next_seq += 1;
        Some(FetchTicket {
            generation: self.generation,
            seq: self.next_seq,
            kind,
        })
    }

    /// True while the ticket belongs to the running activation
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.active && ticket.generation == self.generation
    }

    /// Admit a response for `ticket` and record it as the newest applied.
    pub fn accept(&mut self, ticket: &FetchTicket) -> SyncResult<()> {
        if !self.is_current(ticket) || ticket.seq <= self.last_applied {
            return Err(SyncError::StaleResponse {
                seq: ticket.seq,
                applied: self.last_applied,
            });
        }
        self.last_applied = ticket.seq;
        Ok(())
    }
}

/// Receiver of scheduler requests
#[async_trait]
pub trait FetchHandler: Send + Sync + 'static {
    /// Allocate a ticket, or decline the fetch
    fn issue(&self, kind: FetchKind) -> Option<FetchTicket>;

    /// Perform the fetch and apply its result
    async fn run(&self, ticket: FetchTicket);

    /// Host connectivity changed while the scheduler was active
    fn connectivity_changed(&self, _online: bool) {}
}

/// Periodic fetch driver
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval: Duration,
    catch_up_on_reconnect: bool,
    connectivity: ConnectivityMonitor,
}

impl SyncScheduler {
    pub fn new(interval: Duration, catch_up_on_reconnect: bool, connectivity: ConnectivityMonitor) -> Self {
        Self {
            interval,
            catch_up_on_reconnect,
            connectivity,
        }
    }

    /// Spawn the fetch loop for one activation
    pub fn activate(&self, handler: Arc<dyn FetchHandler>) -> SchedulerHandle {
        let scheduler = self.clone();
        let connectivity_rx = self.connectivity.subscribe();
        let task = tokio::spawn(async move { scheduler.run_loop(handler, connectivity_rx).await });
        SchedulerHandle { task }
    }

    async fn run_loop(self, handler: Arc<dyn FetchHandler>, mut connectivity_rx: watch::Receiver<bool>) {
        let mut in_flight = JoinSet::new();
        let mut watching = true;

        info!(interval_secs = self.interval.as_secs(), "Sync scheduler activated");
        self.request(&mut in_flight, &handler, FetchKind::Initial);

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.request(&mut in_flight, &handler, FetchKind::Scheduled);
                }
                changed = connectivity_rx.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                        continue;
                    }
                    let online = *connectivity_rx.borrow_and_update();
                    handler.connectivity_changed(online);
                    if online && self.catch_up_on_reconnect {
                        self.request(&mut in_flight, &handler, FetchKind::CatchUp);
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = %e, "Notification fetch task panicked");
                        }
                    }
                }
            }
        }
    }

    fn request(&self, in_flight: &mut JoinSet<()>, handler: &Arc<dyn FetchHandler>, kind: FetchKind) {
        if !self.connectivity.is_online() {
            debug!(?kind, "Offline; skipping fetch");
            return;
        }

        let Some(ticket) = handler.issue(kind) else {
            debug!(?kind, "Fetch declined by handler");
            return;
        };

        debug!(seq = ticket.seq, ?kind, "Issuing notification fetch");
        let handler = Arc::clone(handler);
        in_flight.spawn(async move { handler.run(ticket).await });
    }
}

/// Cancellable handle to a running scheduler.
///
/// Dropping the handle cancels the scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the timer and abort every in-flight fetch
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
