//! Observability sink for the client lifecycle.
//!
//! The resolver and supervisor describe what happens as [`ClientEvent`]s and hand
//! them to a [`Reporter`]. Each event has a human-readable `Display`; where it
//! ends up is the reporter's business. [`TracingReporter`] is the one the binary uses.

use std::fmt;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::TransportError;
use crate::identifier::Identifier;
use crate::transport::InboundMessage;

/// Something worth telling an operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The client resolved its identifier and is about to start the supervisor.
    Started { identifier: Identifier },
    /// The identifier variable was empty at the first read.
    WaitingForIdentifier { var: String },
    /// The identifier became available after polling.
    IdentifierResolved { identifier: Identifier, waited: Duration },
    /// The polling ceiling was reached.
    IdentifierMissing { var: String, waited: Duration },
    Connecting { url: String },
    Connected { identifier: Identifier },
    MessageReceived { message: InboundMessage },
    ConnectionFailed {
        attempt: u32,
        max_attempts: u32,
        error: TransportError,
    },
    RetryScheduled { delay: Duration },
    RetriesExhausted { attempts: u32 },
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { identifier } => {
                write!(f, "Bitcoin Switch WebSocket client, switch ID: {identifier}")
            }
            Self::WaitingForIdentifier { var } => {
                write!(f, "No {var} provided, waiting for it to be set")
            }
            Self::IdentifierResolved { identifier, waited } => {
                write!(f, "Switch ID {identifier} available after {}s", waited.as_secs())
            }
            Self::IdentifierMissing { var, waited } => {
                write!(f, "{var} not set after {}s, exiting", waited.as_secs())
            }
            Self::Connecting { url } => write!(f, "Connecting to {url}"),
            Self::Connected { identifier } => {
                write!(f, "Connected to Bitcoin Switch {identifier}")
            }
            Self::MessageReceived { message } => write!(f, "Received: {message}"),
            Self::ConnectionFailed {
                attempt,
                max_attempts,
                error,
            } => write!(
                f,
                "Connection failed (attempt {attempt}/{max_attempts}): {error}"
            ),
            Self::RetryScheduled { delay } => {
                write!(f, "Reconnecting in {}s", delay.as_secs_f64())
            }
            Self::RetriesExhausted { attempts } => {
                write!(f, "Max retries reached after {attempts} attempts, exiting")
            }
        }
    }
}

/// Destination for [`ClientEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ClientEvent);
}

/// Reports events as `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Started { identifier } => {
                info!(switch_id = %identifier, "{}", event)
            }
            ClientEvent::WaitingForIdentifier { var } => warn!(var = %var, "{}", event),
            ClientEvent::IdentifierResolved { identifier, waited } => {
                info!(switch_id = %identifier, waited_secs = waited.as_secs(), "{}", event)
            }
            ClientEvent::IdentifierMissing { var, .. } => error!(var = %var, "{}", event),
            ClientEvent::Connecting { url } => info!(url = %url, "{}", event),
            ClientEvent::Connected { identifier } => {
                info!(switch_id = %identifier, "{}", event)
            }
            ClientEvent::MessageReceived { message } => {
                info!(kind = message.kind(), "{}", event)
            }
            ClientEvent::ConnectionFailed {
                attempt,
                max_attempts,
                ..
            } => warn!(attempt, max_attempts, "{}", event),
            ClientEvent::RetryScheduled { delay } => {
                info!(delay_ms = delay_millis(*delay), "{}", event)
            }
            ClientEvent::RetriesExhausted { attempts } => error!(attempts, "{}", event),
        }
    }
}

/// Milliseconds as a log field, saturating instead of truncating.
fn delay_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
