/*
Memory Notification Cache Adapter

Process-local cache that stores serialized snapshots in a map, the way browser
local storage holds strings. An optional byte quota rejects oversized writes
with a persistence failure, mirroring a storage quota error.
*/

use std::collections::HashMap;
use std::sync::RwLock;

use crate::application::ports::output::notification_cache_port::{cache_key, NotificationCachePort};
use crate::domain::entities::notification_list::NotificationList;
use crate::error::{SyncError, SyncResult};

/// In-memory notification cache
#[derive(Debug, Default)]
pub struct MemoryNotificationCache {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryNotificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that refuses to store any single snapshot larger than `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Store a raw document, bypassing encoding
    pub fn insert_raw(&self, user_id: &str, raw: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(cache_key(user_id), raw.into());
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(&cache_key(user_id)))
            .unwrap_or(false)
    }

    fn unavailable() -> SyncError {
        SyncError::PersistenceFailure("Cache storage unavailable".to_string())
    }
}

impl NotificationCachePort for MemoryNotificationCache {
    fn load(&self, user_id: &str) -> SyncResult<Option<NotificationList>> {
        let entries = self.entries.read().map_err(|_| Self::unavailable())?;
        match entries.get(&cache_key(user_id)) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, user_id: &str, notifications: &NotificationList) -> SyncResult<()> {
        let raw = serde_json::to_string(notifications)
            .map_err(|e| SyncError::PersistenceFailure(format!("Failed to encode cache: {}", e)))?;

        if let Some(quota) = self.quota_bytes {
            if raw.len() > quota {
                return Err(SyncError::PersistenceFailure(format!(
                    "Quota exceeded: {} bytes over a {} byte limit",
                    raw.len(),
                    quota
                )));
            }
        }

        let mut entries = self.entries.write().map_err(|_| Self::unavailable())?;
        entries.insert(cache_key(user_id), raw);
        Ok(())
    }

    fn clear(&self, user_id: &str) -> SyncResult<()> {
        let mut entries = self.entries.write().map_err(|_| Self::unavailable())?;
        entries.remove(&cache_key(user_id));
        Ok(())
    }
}
