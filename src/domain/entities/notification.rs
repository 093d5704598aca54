// src/domain/entities/notification.rs
/*
Notification Entity

A single system notification as delivered by the dashboard's notification feed.
Notifications are value types: the server owns their identity and content, and the
only field the client ever changes is the read flag.

The category tag is a closed set. Tags this build does not recognise decode as
generic activity so a newer server never breaks an older client.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque server-assigned notification identifier.
///
/// The feed sends integer ids; anything stable is accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NotificationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for NotificationId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(number) => Self(number.to_string()),
            RawId::Text(text) => Self(text),
        })
    }
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotificationKind {
    /// A user asked for administrator access
    AdminRequest,
    /// An administrator deleted an account
    DeletionAlert,
    /// A pending account was approved
    Approval,
    /// Periodic energy usage report
    EnergyReport,
    /// Anything else
    #[default]
    Activity,
}

impl NotificationKind {
    /// Map a wire tag to a kind, falling back to [`NotificationKind::Activity`]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "admin_request" => NotificationKind::AdminRequest,
            "user_deletion_alert" => NotificationKind::DeletionAlert,
            "approval" => NotificationKind::Approval,
            "energy_report" => NotificationKind::EnergyReport,
            _ => NotificationKind::Activity,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            NotificationKind::AdminRequest => "admin_request",
            NotificationKind::DeletionAlert => "user_deletion_alert",
            NotificationKind::Approval => "approval",
            NotificationKind::EnergyReport => "energy_report",
            NotificationKind::Activity => "activity",
        }
    }
}

impl Serialize for NotificationKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.map(|t| Self::from_tag(&t)).unwrap_or_default())
    }
}

/// A notification as shown in the dashboard panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    /// Audience the server addressed this notification to (admin, faculty, all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
}

impl Notification {
    /// Creates an unread notification
    pub fn new(
        id: impl Into<NotificationId>,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
            created_at,
            is_read: false,
            target_role: None,
        }
    }

    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    /// Relative age for display, e.g. `5m ago`.
    ///
    /// Timestamps in the future render as `just now`.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let minutes = (now - self.created_at).num_minutes();
        if minutes < 1 {
            return "just now".to_string();
        }
        if minutes < 60 {
            return format!("{}m ago", minutes);
        }
        let hours = minutes / 60;
        if hours < 24 {
            return format!("{}h ago", hours);
        }
        format!("{}d ago", hours / 24)
    }
}
