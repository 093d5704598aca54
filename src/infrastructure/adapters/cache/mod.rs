pub mod file_notification_cache;
pub mod memory_notification_cache;

pub use file_notification_cache::FileNotificationCache;
pub use memory_notification_cache::MemoryNotificationCache;
