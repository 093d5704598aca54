// src/lib.rs
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod setup;

pub use application::service::{
    ConnectivityMonitor, MarkReadOutcome, NotificationState, NotificationStore, SyncScheduler,
};
pub use config::Settings;
pub use domain::entities::notification::{Notification, NotificationId, NotificationKind};
pub use domain::entities::notification_list::{NotificationList, PendingReadSet};
pub use error::{SyncError, SyncResult};
