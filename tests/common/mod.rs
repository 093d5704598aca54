// tests/common/mod.rs - Shared fixtures for notification sync integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::{oneshot, watch};

use notification_sync::application::ports::output::notification_feed_port::NotificationFeedPort;
use notification_sync::config::SyncConfig;
use notification_sync::infrastructure::adapters::cache::MemoryNotificationCache;
use notification_sync::{
    ConnectivityMonitor, Notification, NotificationId, NotificationKind, NotificationState,
    NotificationStore, SyncError, SyncResult,
};

static INIT: Once = Once::new();

/// Install tracing output when `TEST_LOG` is set
pub fn init_test_env() {
    INIT.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            notification_sync::setup::init_tracing("debug");
        }
    });
}

/// Unread notification with a fixed timestamp
pub fn notification(id: &str) -> Notification {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    Notification::new(id, NotificationKind::Activity, format!("notification {}", id), created_at)
}

pub fn read(id: &str) -> Notification {
    notification(id).with_read(true)
}

enum Step {
    Gate(oneshot::Receiver<SyncResult<Vec<Notification>>>),
    Fail(SyncError),
}

/// Held fetch; released with a payload or a failure
pub struct Gate(oneshot::Sender<SyncResult<Vec<Notification>>>);

impl Gate {
    /// Release with `notifications`. False if the fetch was cancelled.
    pub fn open(self, notifications: Vec<Notification>) -> bool {
        self.0.send(Ok(notifications)).is_ok()
    }

    /// Release with `error`. False if the fetch was cancelled.
    pub fn fail(self, error: SyncError) -> bool {
        self.0.send(Err(error)).is_ok()
    }
}

/// Feed double. Fetches consume queued steps first, then serve the server truth.
pub struct ScriptedFeed {
    truth: Mutex<Vec<Notification>>,
    steps: Mutex<VecDeque<Step>>,
    fetches: AtomicUsize,
    acks: Mutex<Vec<NotificationId>>,
    ack_result: Mutex<SyncResult<()>>,
}

impl ScriptedFeed {
    pub fn new(truth: Vec<Notification>) -> Arc<Self> {
        Arc::new(Self {
            truth: Mutex::new(truth),
            steps: Mutex::new(VecDeque::new()),
            fetches: AtomicUsize::new(0),
            acks: Mutex::new(Vec::new()),
            ack_result: Mutex::new(Ok(())),
        })
    }

    pub fn set_truth(&self, truth: Vec<Notification>) {
        *self.truth.lock().unwrap() = truth;
    }

    pub fn truth(&self) -> Vec<Notification> {
        self.truth.lock().unwrap().clone()
    }

    /// Queue a fetch that blocks until the returned gate is released
    pub fn push_gate(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.steps.lock().unwrap().push_back(Step::Gate(rx));
        Gate(tx)
    }

    pub fn push_failure(&self, error: SyncError) {
        self.steps.lock().unwrap().push_back(Step::Fail(error));
    }

    pub fn set_ack_result(&self, result: SyncResult<()>) {
        *self.ack_result.lock().unwrap() = result;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn acks(&self) -> Vec<NotificationId> {
        self.acks.lock().unwrap().clone()
    }

    /// Yield until at least `count` fetches have started
    pub async fn wait_for_fetches(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.fetch_count() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("fetches never started");
    }
}

#[async_trait]
impl NotificationFeedPort for ScriptedFeed {
    async fn fetch_notifications(&self) -> SyncResult<Vec<Notification>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Gate(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(SyncError::Transport("gate dropped".to_string()))),
            Some(Step::Fail(error)) => Err(error),
            None => Ok(self.truth()),
        }
    }

    async fn mark_read(&self, id: &NotificationId) -> SyncResult<()> {
        self.acks.lock().unwrap().push(id.clone());
        let result = self.ack_result.lock().unwrap().clone();
        if result.is_ok() {
            for notification in self.truth.lock().unwrap().iter_mut() {
                if &notification.id == id {
                    notification.is_read = true;
                }
            }
        }
        result
    }
}

/// Sync timing that keeps the interval timer out of the way
pub fn quiet_config() -> SyncConfig {
    SyncConfig {
        poll_interval_secs: 3600,
        request_timeout_secs: 3600,
        catch_up_on_reconnect: true,
    }
}

pub struct Harness {
    pub feed: Arc<ScriptedFeed>,
    pub cache: Arc<MemoryNotificationCache>,
    pub connectivity: ConnectivityMonitor,
    pub store: NotificationStore,
}

impl Harness {
    pub fn new(truth: Vec<Notification>) -> Self {
        Self::with_config(truth, true, quiet_config())
    }

    pub fn with_config(truth: Vec<Notification>, online: bool, config: SyncConfig) -> Self {
        init_test_env();
        let feed = ScriptedFeed::new(truth);
        let cache = Arc::new(MemoryNotificationCache::new());
        let connectivity = ConnectivityMonitor::new(online);
        let store = NotificationStore::new(feed.clone(), cache.clone(), connectivity.clone(), &config);
        Self {
            feed,
            cache,
            connectivity,
            store,
        }
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> NotificationState
    where
        F: FnMut(&NotificationState) -> bool,
    {
        let mut rx: watch::Receiver<NotificationState> = self.store.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|state| predicate(state)))
            .await
            .expect("state never reached")
            .expect("store dropped");
        let snapshot = state.clone();
        snapshot
    }
}

/// Let spawned tasks run to their next suspension point
pub async fn drain_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn ids(state: &NotificationState) -> Vec<String> {
    state
        .notifications
        .iter()
        .map(|notification| notification.id.to_string())
        .collect()
}

pub fn unread_ids(state: &NotificationState) -> Vec<String> {
    state
        .notifications
        .iter()
        .filter(|notification| !notification.is_read)
        .map(|notification| notification.id.to_string())
        .collect()
}
