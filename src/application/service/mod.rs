pub mod connectivity;
pub mod local_cache;
pub mod notification_store;
pub mod scheduler;

pub use connectivity::ConnectivityMonitor;
pub use local_cache::LocalCache;
pub use notification_store::{MarkReadOutcome, NotificationState, NotificationStore};
pub use scheduler::{FetchKind, FetchSequencer, FetchTicket, SchedulerHandle, SyncScheduler};
