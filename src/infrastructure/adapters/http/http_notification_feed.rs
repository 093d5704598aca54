use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::ports::output::notification_feed_port::NotificationFeedPort;
use crate::config::ApiConfig;
use crate::domain::entities::notification::{Notification, NotificationId};
use crate::error::{SyncError, SyncResult};

/// Notification feed backed by the dashboard REST API.
///
/// `GET {base_url}/notifications` returns the caller's feed, newest first, and
/// `POST {base_url}/notifications/{id}/read` acknowledges a read.
#[derive(Debug, Clone)]
pub struct HttpNotificationFeed {
    base_url: String,
    client: Client,
}

impl HttpNotificationFeed {
    /// Create a feed client. The token, when set, is sent as a bearer credential.
    pub fn new(config: &ApiConfig, timeout: Duration) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SyncError::Transport("Invalid bearer token format".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn feed_url(&self) -> String {
        format!("{}/notifications", self.base_url)
    }

    fn read_url(&self, id: &NotificationId) -> String {
        format!("{}/notifications/{}/read", self.base_url, urlencoding::encode(id.as_str()))
    }

    fn check_status(response: Response, id: Option<&NotificationId>) -> SyncResult<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(SyncError::Unauthorized),
            StatusCode::NOT_FOUND => Err(SyncError::NotFound(
                id.map_or_else(|| response.url().path().to_string(), |id| id.to_string()),
            )),
            status => Err(SyncError::Http {
                status: status.as_u16(),
            }),
        }
    }
}

/// Decode feed entries one by one, skipping any the engine cannot represent
fn decode_feed(entries: Vec<Value>) -> Vec<Notification> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Notification>(entry) {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!(error = %e, "Skipping malformed notification");
                None
            }
        })
        .collect()
}

#[async_trait]
impl NotificationFeedPort for HttpNotificationFeed {
    async fn fetch_notifications(&self) -> SyncResult<Vec<Notification>> {
        let response = self.client.get(self.feed_url()).send().await?;
        let response = Self::check_status(response, None)?;

        let entries: Vec<Value> = response.json().await?;
        let notifications = decode_feed(entries);
        debug!(count = notifications.len(), "Fetched notification feed");
        Ok(notifications)
    }

    async fn mark_read(&self, id: &NotificationId) -> SyncResult<()> {
        let response = self.client.post(self.read_url(id)).send().await?;
        Self::check_status(response, Some(id))?;
        debug!(%id, "Acknowledged notification read");
        Ok(())
    }
}
