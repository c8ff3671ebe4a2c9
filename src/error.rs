//! Error types for switch-presence

use std::time::Duration;
use thiserror::Error;

/// Transport-level failures of a single connect-listen cycle.
///
/// The supervisor treats every variant the same way: it is counted against the
/// attempt budget and followed by the fixed retry delay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("WebSocket connect to {url} failed: {reason}")]
    ConnectFailure { url: String, reason: String },

    #[error("WebSocket read failed: {0}")]
    ReadFailure(String),

    #[error("Remote closed connection: {reason}")]
    RemoteClosed { reason: String },
}

impl TransportError {
    pub fn connect(url: &str, reason: impl ToString) -> Self {
        Self::ConnectFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn closed(reason: impl Into<String>) -> Self {
        Self::RemoteClosed {
            reason: reason.into(),
        }
    }
}

/// Errors that end the process.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{var} not set after {}s", .waited.as_secs())]
    ConfigurationMissing { var: String, waited: Duration },

    #[error("Max retries reached ({attempts}/{max_attempts})")]
    RetriesExhausted {
        attempts: u32,
        max_attempts: u32,
        #[source]
        last_error: TransportError,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_missing_message() {
        let err = ClientError::ConfigurationMissing {
            var: "SWITCH_ID".into(),
            waited: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "SWITCH_ID not set after 60s");
    }

    #[test]
    fn test_retries_exhausted_keeps_last_error_as_source() {
        let err = ClientError::RetriesExhausted {
            attempts: 10,
            max_attempts: 10,
            last_error: TransportError::connect("ws://host/abc", "connection refused"),
        };
        assert_eq!(err.to_string(), "Max retries reached (10/10)");

        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(
            source.to_string(),
            "WebSocket connect to ws://host/abc failed: connection refused"
        );
    }
}
