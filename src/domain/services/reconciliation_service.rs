// src/domain/services/reconciliation_service.rs
/*
Reconciliation Service

Merges an authoritative server snapshot with the reads the client has applied
optimistically but not yet seen confirmed.

Merge policy:
- The snapshot decides which notifications exist, their content and their order.
- The snapshot decides the read flag, except for ids still pending locally. Those
  are always reported read, whatever the server says.
- A pending id the snapshot already reports read has been confirmed and leaves
  the pending set.
- A pending id missing from the snapshot was removed server side and is dropped
  from the pending set without further signal.
*/

use crate::domain::entities::notification::NotificationId;
use crate::domain::entities::notification_list::{NotificationList, PendingReadSet};

/// Output of a single reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// New authoritative list
    pub notifications: NotificationList,
    /// Pending ids that still need protecting after this pass
    pub pending: PendingReadSet,
    /// Pending ids the server now reports read
    pub promoted: Vec<NotificationId>,
    /// Pending ids absent from the snapshot
    pub dropped: Vec<NotificationId>,
}

/// Merges `remote` with the locally pending reads.
pub fn reconcile(remote: NotificationList, pending: &PendingReadSet) -> Reconciliation {
    let mut still_pending = PendingReadSet::new();
    let mut promoted = Vec::new();

    let notifications: NotificationList = remote
        .into_iter()
        .map(|mut notification| {
            if pending.contains(&notification.id) {
                if notification.is_read {
                    promoted.push(notification.id.clone());
                } else {
                    notification.is_read = true;
                    still_pending.insert(notification.id.clone());
                }
            }
            notification
        })
        .collect();

    let dropped = pending
        .iter()
        .filter(|id| !notifications.contains(id))
        .cloned()
        .collect();

    Reconciliation {
        notifications,
        pending: still_pending,
        promoted,
        dropped,
    }
}
