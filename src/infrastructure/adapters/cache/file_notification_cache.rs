/*
File Notification Cache Adapter

Stores one JSON document per user under a cache directory. The document has the
same array shape as the notification feed. Writes go to a temporary file first
and are renamed into place, so a crash mid-write leaves the previous snapshot
intact.
*/

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::application::ports::output::notification_cache_port::{cache_key, NotificationCachePort};
use crate::domain::entities::notification_list::NotificationList;
use crate::error::{SyncError, SyncResult};

/// File-backed notification cache
#[derive(Debug, Clone)]
pub struct FileNotificationCache {
    directory: PathBuf,
}

impl FileNotificationCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the document holding `user_id`'s notifications.
    ///
    /// The key is percent-encoded so distinct user ids never share a file.
    pub fn path_for(&self, user_id: &str) -> PathBuf {
        self.directory.join(format!("{}.json", urlencoding::encode(&cache_key(user_id))))
    }
}

impl NotificationCachePort for FileNotificationCache {
    fn load(&self, user_id: &str) -> SyncResult<Option<NotificationList>> {
        let raw = match fs::read_to_string(self.path_for(user_id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let notifications = serde_json::from_str(&raw)?;
        Ok(Some(notifications))
    }

    fn save(&self, user_id: &str, notifications: &NotificationList) -> SyncResult<()> {
        fs::create_dir_all(&self.directory)?;

        let path = self.path_for(user_id);
        let tmp_path = path.with_extension("json.tmp");
        let payload = serde_json::to_vec(notifications)
            .map_err(|e| SyncError::PersistenceFailure(format!("Failed to encode cache: {}", e)))?;

        fs::write(&tmp_path, payload)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn clear(&self, user_id: &str) -> SyncResult<()> {
        match fs::remove_file(self.path_for(user_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
