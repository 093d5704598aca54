// src/domain/entities/notification_list.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::notification::{Notification, NotificationId};

/// Ordered notifications for one user, unique by id.
///
/// Duplicated ids keep their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NotificationList {
    items: Vec<Notification>,
}

impl NotificationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(notifications: Vec<Notification>) -> Self {
        notifications.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NotificationId) -> bool {
        self.get(id).is_some()
    }

    /// Sets the read flag on `id`.
    ///
    /// Returns `None` when the id is absent, otherwise whether the flag changed.
    pub fn mark_read(&mut self, id: &NotificationId) -> Option<bool> {
        let notification = self.items.iter_mut().find(|n| &n.id == id)?;
        let changed = !notification.is_read;
        notification.is_read = true;
        Some(changed)
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<Notification> for NotificationList {
    fn from_iter<I: IntoIterator<Item = Notification>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let items = iter
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect();
        Self { items }
    }
}

impl<'a> IntoIterator for &'a NotificationList {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for NotificationList {
    type Item = Notification;
    type IntoIter = std::vec::IntoIter<Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'de> Deserialize<'de> for NotificationList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Notification>::deserialize(deserializer).map(Self::from_vec)
    }
}

/// Ids marked read locally whose acknowledgement has not been confirmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingReadSet {
    ids: BTreeSet<NotificationId>,
}

impl PendingReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was not already pending
    pub fn insert(&mut self, id: NotificationId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &NotificationId) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: &NotificationId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationId> {
        self.ids.iter()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<NotificationId> for PendingReadSet {
    fn from_iter<I: IntoIterator<Item = NotificationId>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::notification::NotificationKind;
    use chrono::Utc;

    fn note(id: &str, is_read: bool) -> Notification {
        Notification::new(id, NotificationKind::Activity, format!("message {}", id), Utc::now()).with_read(is_read)
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let first = note("a", false);
        let mut duplicate = note("a", true);
        duplicate.message = "later copy".to_string();

        let list = NotificationList::from_vec(vec![first.clone(), note("b", false), duplicate]);

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(&"a".into()), Some(&first));
    }

    #[test]
    fn test_mark_read_reports_change() {
        let mut list = NotificationList::from_vec(vec![note("a", false), note("b", true)]);

        assert_eq!(list.mark_read(&"a".into()), Some(true));
        assert_eq!(list.mark_read(&"a".into()), Some(false));
        assert_eq!(list.mark_read(&"b".into()), Some(false));
        assert_eq!(list.mark_read(&"zzz".into()), None);
        assert_eq!(list.unread_count(), 0);
    }

    #[test]
    fn test_deserialize_dedupes() {
        let json = r#"[
            {"id": 1, "type": "approval", "message": "x", "created_at": "2025-01-01T00:00:00Z", "is_read": false},
            {"id": "1", "type": "approval", "message": "y", "created_at": "2025-01-01T00:00:00Z", "is_read": true}
        ]"#;
        let list: NotificationList = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.unread_count(), 1);
    }

    #[test]
    fn test_pending_set_membership() {
        let mut pending = PendingReadSet::new();
        assert!(pending.insert("n1".into()));
        assert!(!pending.insert("n1".into()));
        assert!(pending.contains(&"n1".into()));
        assert!(pending.remove(&"n1".into()));
        assert!(pending.is_empty());
    }
}
