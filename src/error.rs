// src/error.rs
use thiserror::Error;

/// Result type used across the sync engine and its ports
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while synchronizing notifications.
///
/// None of these are fatal to the engine. Callers that receive one keep their
/// last-known-good state and carry on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Notification not found: {0}")]
    NotFound(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Stale response: sequence {seq} superseded by {applied}")]
    StaleResponse { seq: u64, applied: u64 },

    #[error("Session unauthorized")]
    Unauthorized,

    #[error("Unexpected HTTP status: {status}")]
    Http { status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),
}

impl SyncError {
    /// True when the failure came from the connection rather than the server
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SyncError::NetworkUnavailable(_) | SyncError::Timeout | SyncError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_connect() {
            SyncError::NetworkUnavailable(err.to_string())
        } else if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Http { status: status.as_u16() }
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::PersistenceFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(SyncError::Timeout.is_network());
        assert!(SyncError::NetworkUnavailable("offline".to_string()).is_network());
        assert!(!SyncError::Unauthorized.is_network());
        assert!(!SyncError::Http { status: 500 }.is_network());
    }

    #[test]
    fn test_stale_response_message() {
        let error = SyncError::StaleResponse { seq: 1, applied: 2 };
        assert!(error.to_string().contains("sequence 1 superseded by 2"));
    }

    #[test]
    fn test_io_error_maps_to_persistence_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let error: SyncError = io.into();
        assert!(matches!(error, SyncError::PersistenceFailure(msg) if msg.contains("disk full")));
    }
}
