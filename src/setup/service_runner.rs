use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::service::{ConnectivityMonitor, NotificationState, NotificationStore};
use crate::config::Settings;
use crate::error::SyncResult;
use crate::infrastructure::adapters::cache::FileNotificationCache;
use crate::infrastructure::adapters::http::HttpNotificationFeed;

/// Wired components of a running engine
pub struct SyncRuntime {
    pub store: NotificationStore,
    pub connectivity: ConnectivityMonitor,
}

/// Build the store and its adapters from settings
pub fn build_runtime(settings: &Settings) -> SyncResult<SyncRuntime> {
    let feed = HttpNotificationFeed::new(&settings.api, settings.sync.request_timeout())?;
    let cache = FileNotificationCache::new(settings.cache.directory.clone());
    let connectivity = ConnectivityMonitor::new(true);

    info!(
        base_url = feed.base_url(),
        cache_dir = %settings.cache.directory.display(),
        poll_interval_secs = settings.sync.poll_interval_secs,
        "Notification sync configured"
    );

    let store = NotificationStore::new(Arc::new(feed), Arc::new(cache), connectivity.clone(), &settings.sync);
    Ok(SyncRuntime { store, connectivity })
}

/// Log every published state until the store goes away
pub fn spawn_state_logger(mut rx: watch::Receiver<NotificationState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            let badge = state.badge_label().unwrap_or_default();
            if state.session_expired {
                warn!("Session expired; sign in again to resume notification sync");
            }
            info!(
                total = state.notifications.len(),
                unread = state.unread_count,
                badge = %badge,
                loading = state.is_loading,
                offline = state.is_offline,
                "Notification state updated"
            );
        }
    })
}

/// Start syncing for `user_id` and block until Ctrl-C or SIGTERM
pub async fn run_until_shutdown(runtime: SyncRuntime, user_id: String) -> std::io::Result<()> {
    let logger = spawn_state_logger(runtime.store.subscribe());
    runtime.store.start(user_id);

    wait_for_shutdown().await?;

    info!("Shutting down notification sync");
    runtime.store.stop();
    logger.abort();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
