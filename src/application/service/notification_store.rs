/*
Notification Store

Public state container for the signed-in user's notifications. It owns the
notification list and the set of optimistic reads, and composes the other sync
components:

- LocalCache hydrates the list on start and receives every change
- SyncScheduler requests fetches; the store runs them and applies results
- the reconciliation service merges each snapshot with pending reads
- ConnectivityMonitor gates network calls and feeds the offline flag

Three sources change independently: the server, the cache and the user. The
store keeps them consistent with these rules:

1. A fetch response is applied only if it belongs to the running activation and
   was issued after the last applied response.
2. Reads the user made locally stay read until the server confirms them or the
   notification disappears from the feed.
3. Nothing here fails loudly. Network and storage errors are logged and the
   last known good state stays on screen.

All state sits behind one mutex that is never held across an await; the fetch
and acknowledgement calls are the only suspension points.
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::application::ports::output::notification_cache_port::NotificationCachePort;
use crate::application::ports::output::notification_feed_port::NotificationFeedPort;
use crate::application::service::connectivity::ConnectivityMonitor;
use crate::application::service::local_cache::LocalCache;
use crate::application::service::scheduler::{
    FetchHandler, FetchKind, FetchSequencer, FetchTicket, SchedulerHandle, SyncScheduler,
};
use crate::config::SyncConfig;
use crate::domain::entities::notification::{Notification, NotificationId};
use crate::domain::entities::notification_list::{NotificationList, PendingReadSet};
use crate::domain::services::reconciliation_service::reconcile;
use crate::error::{SyncError, SyncResult};

/// Read surface consumed by presentation code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    /// True until the first fetch of an activation settles
    pub is_loading: bool,
    pub is_offline: bool,
    /// The feed rejected the session's credentials
    pub session_expired: bool,
}

impl NotificationState {
    /// Unread badge text, capped at `9+`. `None` when nothing is unread.
    pub fn badge_label(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            count if count > 9 => Some("9+".to_string()),
            count => Some(count.to_string()),
        }
    }
}

/// What `mark_read` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkReadOutcome {
    /// Marked locally and confirmed by the server
    Acknowledged,
    /// Marked locally; offline, so no acknowledgement was sent
    Deferred,
    /// Marked locally; the acknowledgement failed and will not be retried
    AcknowledgementFailed,
    /// Already read, nothing sent
    AlreadyRead,
    /// No such notification in the current list
    NotFound,
}

struct StoreInner {
    user_id: Option<String>,
    notifications: NotificationList,
    pending: PendingReadSet,
    /// Acknowledged reads, keyed to the last ticket issued before the ack.
    /// They stay pending until a snapshot from a later ticket is applied.
    acknowledged: HashMap<NotificationId, u64>,
    sequencer: FetchSequencer,
    is_loading: bool,
    session_expired: bool,
}

impl StoreInner {
    /// Release acknowledged reads that the snapshot from `applied_seq` covers
    fn settle_acknowledged(&mut self, applied_seq: u64) {
        let StoreInner { acknowledged, pending, .. } = self;
        acknowledged.retain(|id, issued_before_ack| {
            if !pending.contains(id) {
                return false;
            }
            if applied_seq > *issued_before_ack {
                debug!(%id, "Acknowledged read covered by newer snapshot");
                pending.remove(id);
                return false;
            }
            true
        });
    }

    fn forget_reads(&mut self) {
        self.pending.clear();
        self.acknowledged.clear();
    }
}

struct StoreCore {
    feed: Arc<dyn NotificationFeedPort>,
    cache: LocalCache,
    connectivity: ConnectivityMonitor,
    request_timeout: Duration,
    inner: Mutex<StoreInner>,
    state_tx: watch::Sender<NotificationState>,
}

impl StoreCore {
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn build_state(&self, inner: &StoreInner) -> NotificationState {
        NotificationState {
            notifications: inner.notifications.as_slice().to_vec(),
            unread_count: inner.notifications.unread_count(),
            is_loading: inner.is_loading,
            is_offline: !self.connectivity.is_online(),
            session_expired: inner.session_expired,
        }
    }

    fn publish(&self, inner: &StoreInner) {
        let next = self.build_state(inner);
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn persist(&self, inner: &StoreInner) {
        if let Some(user_id) = &inner.user_id {
            self.cache.save(user_id, &inner.notifications);
        }
    }

    async fn with_timeout<T, F>(&self, call: F) -> SyncResult<T>
    where
        F: std::future::Future<Output = SyncResult<T>>,
    {
        match time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout),
        }
    }

    fn apply_snapshot(&self, ticket: FetchTicket, snapshot: Vec<Notification>) {
        let mut inner = self.lock();

        if let Err(e) = inner.sequencer.accept(&ticket) {
            debug!(seq = ticket.seq, kind = ?ticket.kind, error = %e, "Discarding notification response");
            return;
        }

        let result = reconcile(NotificationList::from_vec(snapshot), &inner.pending);
        for id in &result.promoted {
            debug!(%id, "Server confirmed pending read");
        }
        for id in &result.dropped {
            debug!(%id, "Pending read vanished from feed; dropping");
        }

        inner.notifications = result.notifications;
        inner.pending = result.pending;
        inner.settle_acknowledged(ticket.seq);
        inner.is_loading = false;
        inner.session_expired = false;

        debug!(
            seq = ticket.seq,
            count = inner.notifications.len(),
            unread = inner.notifications.unread_count(),
            "Applied notification snapshot"
        );
        self.persist(&inner);
        self.publish(&inner);
    }

    fn record_fetch_failure(&self, ticket: FetchTicket, error: SyncError) {
        let mut inner = self.lock();

        if !inner.sequencer.is_current(&ticket) || ticket.seq <= inner.sequencer.last_applied() {
            debug!(seq = ticket.seq, error = %error, "Ignoring failure from superseded fetch");
            return;
        }

        match &error {
            SyncError::Unauthorized => {
                warn!(seq = ticket.seq, "Notification feed rejected the session");
                inner.session_expired = true;
            }
            e if e.is_network() => {
                debug!(seq = ticket.seq, error = %e, "Fetch failed; keeping last known notifications");
            }
            e => {
                warn!(seq = ticket.seq, error = %e, "Fetch failed; keeping last known notifications");
            }
        }

        inner.is_loading = false;
        self.publish(&inner);
    }
}

#[async_trait]
impl FetchHandler for StoreCore {
    fn issue(&self, kind: FetchKind) -> Option<FetchTicket> {
        self.lock().sequencer.issue(kind)
    }

    async fn run(&self, ticket: FetchTicket) {
        if !self.connectivity.is_online() {
            debug!(seq = ticket.seq, "Went offline before fetch started");
            let error = SyncError::NetworkUnavailable("host offline".to_string());
            self.record_fetch_failure(ticket, error);
            return;
        }

        match self.with_timeout(self.feed.fetch_notifications()).await {
            Ok(snapshot) => self.apply_snapshot(ticket, snapshot),
            Err(e) => self.record_fetch_failure(ticket, e),
        }
    }

    fn connectivity_changed(&self, online: bool) {
        let mut inner = self.lock();
        if !online {
            inner.is_loading = false;
        }
        self.publish(&inner);
    }
}

/// Notification state container for one session.
///
/// `start` spawns the scheduler and must be called from within a Tokio runtime.
pub struct NotificationStore {
    core: Arc<StoreCore>,
    scheduler: SyncScheduler,
    handle: Mutex<Option<SchedulerHandle>>,
}

impl NotificationStore {
    pub fn new(
        feed: Arc<dyn NotificationFeedPort>,
        cache: Arc<dyn NotificationCachePort>,
        connectivity: ConnectivityMonitor,
        config: &SyncConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(NotificationState {
            is_offline: !connectivity.is_online(),
            ..NotificationState::default()
        });

        let core = StoreCore {
            feed,
            cache: LocalCache::new(cache),
            connectivity: connectivity.clone(),
            request_timeout: config.request_timeout(),
            inner: Mutex::new(StoreInner {
                user_id: None,
                notifications: NotificationList::new(),
                pending: PendingReadSet::new(),
                acknowledged: HashMap::new(),
                sequencer: FetchSequencer::new(),
                is_loading: false,
                session_expired: false,
            }),
            state_tx,
        };

        Self {
            core: Arc::new(core),
            scheduler: SyncScheduler::new(config.poll_interval(), config.catch_up_on_reconnect, connectivity),
            handle: Mutex::new(None),
        }
    }

    /// Current state, with the offline flag read live from the monitor
    pub fn state(&self) -> NotificationState {
        let inner = self.core.lock();
        self.core.build_state(&inner)
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.core.state_tx.subscribe()
    }

    pub fn user_id(&self) -> Option<String> {
        self.core.lock().user_id.clone()
    }

    pub fn is_active(&self) -> bool {
        self.core.lock().sequencer.is_active()
    }

    /// Ids read locally that no applied snapshot has confirmed yet
    pub fn pending_reads(&self) -> Vec<NotificationId> {
        self.core.lock().pending.iter().cloned().collect()
    }

    /// Activate the store for `user_id`: hydrate from cache and start syncing.
    ///
    /// Any previous activation is stopped first, and nothing it cached or had
    /// pending carries over.
    pub fn start(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.stop();

        {
            let mut inner = self.core.lock();
            inner.sequencer.activate();
            inner.notifications = self.core.cache.load(&user_id);
            inner.forget_reads();
            inner.is_loading = self.core.connectivity.is_online();
            inner.session_expired = false;
            inner.user_id = Some(user_id.clone());
            self.core.publish(&inner);
        }

        info!(user_id = %user_id, "Notification store started");
        let handler: Arc<dyn FetchHandler> = self.core.clone();
        let handle = self.scheduler.activate(handler);
        *self.lock_handle() = Some(handle);
    }

    /// Deactivate: cancel the scheduler and retire every in-flight fetch
    pub fn stop(&self) {
        if let Some(handle) = self.lock_handle().take() {
            handle.cancel();
        }

        let mut inner = self.core.lock();
        if inner.sequencer.is_active() {
            inner.sequencer.deactivate();
            inner.is_loading = false;
            info!("Notification store stopped");
            self.core.publish(&inner);
        }
    }

    /// Stop and forget the user: memory, pending reads and cache entry
    pub fn sign_out(&self) {
        self.stop();

        let mut inner = self.core.lock();
        if let Some(user_id) = inner.user_id.take() {
            self.core.cache.clear(&user_id);
            info!(user_id = %user_id, "Signed out of notification store");
        }
        inner.notifications.clear();
        inner.forget_reads();
        inner.session_expired = false;
        self.core.publish(&inner);
    }

    /// Fetch once now through the same sequencing as scheduled fetches.
    ///
    /// Returns false when inactive or offline.
    pub async fn refresh(&self) -> bool {
        if !self.core.connectivity.is_online() {
            return false;
        }
        let Some(ticket) = self.core.issue(FetchKind::Manual) else {
            return false;
        };
        self.core.run(ticket).await;
        true
    }

    /// Mark `id` read now and acknowledge it to the server when online.
    ///
    /// The local change is kept whatever the acknowledgement does.
    pub async fn mark_read(&self, id: impl Into<NotificationId>) -> MarkReadOutcome {
        let id = id.into();

        let generation = {
            let mut inner = self.core.lock();
            match inner.notifications.mark_read(&id) {
                None => {
                    let error = SyncError::NotFound(id.to_string());
                    warn!(error = %error, "Ignoring mark-read");
                    return MarkReadOutcome::NotFound;
                }
                Some(false) => {
                    debug!(%id, "Notification already read");
                    return MarkReadOutcome::AlreadyRead;
                }
                Some(true) => {}
            }

            inner.pending.insert(id.clone());
            self.core.persist(&inner);
            self.core.publish(&inner);
            inner.sequencer.generation()
        };

        if !self.core.connectivity.is_online() {
            debug!(%id, "Offline; read stays pending");
            return MarkReadOutcome::Deferred;
        }

        match self.core.with_timeout(self.core.feed.mark_read(&id)).await {
            Ok(()) => {
                let mut inner = self.core.lock();
                if inner.sequencer.generation() == generation && inner.pending.contains(&id) {
                    let issued_before_ack = inner.sequencer.last_issued();
                    inner.acknowledged.insert(id.clone(), issued_before_ack);
                }
                MarkReadOutcome::Acknowledged
            }
            Err(e) => {
                warn!(%id, error = %e, "Read acknowledgement failed; keeping local read");
                MarkReadOutcome::AcknowledgementFailed
            }
        }
    }

    /// Empty the list and the cache without telling the server.
    ///
    /// The next successful fetch repopulates the list from server truth.
    pub fn clear_all(&self) {
        let mut inner = self.core.lock();
        inner.notifications.clear();
        if let Some(user_id) = &inner.user_id {
            self.core.cache.clear(user_id);
        }
        debug!("Cleared notifications locally");
        self.core.publish(&inner);
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<SchedulerHandle>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for NotificationStore {
    fn drop(&mut self) {
        self.stop();
    }
}
