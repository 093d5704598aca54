/*
Notification Feed Port

Output port the sync engine uses to talk to the dashboard's notification API.
The engine only ever needs two operations: read the current feed for the
signed-in user and acknowledge that a notification was read. Adapters decide
how the user is authenticated; the port itself is user-agnostic.

Adapters:
- HttpNotificationFeed (infrastructure/adapters/http): REST implementation
- test doubles in tests/common
*/

use async_trait::async_trait;

use crate::domain::entities::notification::{Notification, NotificationId};
use crate::error::SyncResult;

/// Remote source of truth for notifications
#[async_trait]
pub trait NotificationFeedPort: Send + Sync {
    /// Fetch the full notification feed, newest first as the server orders it
    async fn fetch_notifications(&self) -> SyncResult<Vec<Notification>>;

    /// Acknowledge that `id` was read
    async fn mark_read(&self, id: &NotificationId) -> SyncResult<()>;
}
