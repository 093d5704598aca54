/*
Notification Cache Port

Output port for durable, per-user storage of the last known notification list.
Storage is keyed by the signed-in user's id so several accounts on one device
never share state.

Adapters report failures honestly; it is the LocalCache service in the
application layer that turns them into the engine's never-fail contract.
*/

use crate::domain::entities::notification_list::NotificationList;
use crate::error::SyncResult;

/// Cache key for a user's notification list
pub fn cache_key(user_id: &str) -> String {
    format!("notifications_{}", user_id)
}

/// Synchronous key/value persistence for notification snapshots
pub trait NotificationCachePort: Send + Sync {
    /// Load the stored list. `Ok(None)` means nothing is stored for this user.
    fn load(&self, user_id: &str) -> SyncResult<Option<NotificationList>>;

    /// Replace the stored list
    fn save(&self, user_id: &str, notifications: &NotificationList) -> SyncResult<()>;

    /// Remove the stored list, succeeding if nothing was stored
    fn clear(&self, user_id: &str) -> SyncResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_namespaced_by_user() {
        assert_eq!(cache_key("17"), "notifications_17");
        assert_ne!(cache_key("alice"), cache_key("bob"));
    }
}
