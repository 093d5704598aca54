/*
Local Cache Service

Durability for the notification list is an optimisation, not a correctness
requirement. This service wraps a cache adapter and guarantees the engine never
sees a cache failure: loads fall back to an empty list and failed writes are
logged and dropped.
*/

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::ports::output::notification_cache_port::NotificationCachePort;
use crate::domain::entities::notification_list::NotificationList;

/// Never-failing facade over a [`NotificationCachePort`]
#[derive(Clone)]
pub struct LocalCache {
    port: Arc<dyn NotificationCachePort>,
}

impl LocalCache {
    pub fn new(port: Arc<dyn NotificationCachePort>) -> Self {
        Self { port }
    }

    /// Stored list for `user_id`, or an empty list if absent or unreadable
    pub fn load(&self, user_id: &str) -> NotificationList {
        match self.port.load(user_id) {
            Ok(Some(notifications)) => {
                debug!(user_id, count = notifications.len(), "Hydrated notifications from cache");
                notifications
            }
            Ok(None) => NotificationList::new(),
            Err(e) => {
                warn!(user_id, error = %e, "Discarding unreadable notification cache");
                NotificationList::new()
            }
        }
    }

    pub fn save(&self, user_id: &str, notifications: &NotificationList) {
        if let Err(e) = self.port.save(user_id, notifications) {
            warn!(user_id, error = %e, "Failed to persist notifications; continuing in memory");
        }
    }

    pub fn clear(&self, user_id: &str) {
        if let Err(e) = self.port.clear(user_id) {
            warn!(user_id, error = %e, "Failed to clear notification cache");
        }
    }
}
