//! Connection Supervisor
//!
//! Single responsibility: keep one connection to `<base_url>/<identifier>` open,
//! reconnecting after failures until the attempt budget runs out.
//!
//! # State machine
//!
//! ```text
//!   Idle ──► Connecting ──► Connected ──┐ (message: stay Connected)
//!                ▲   │          │ ◄────┘
//!                │   └──────────┴──► Failed ──► Exhausted (attempts >= max)
//!                │                      │
//!                └──── retry delay ◄────┘ (attempts < max)
//! ```
//!
//! Every transport error, including a clean close by the server, is a failure and
//! costs one attempt. The delay between attempts is fixed. There is no delay after
//! the final failure: the supervisor goes straight to `Exhausted`.
//!
//! The attempt counter is monotonic for the supervisor's lifetime unless
//! [`SupervisorConfig::reset_attempts_on_connect`] is set.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{ClientError, Result, TransportError};
use crate::identifier::Identifier;
use crate::report::{ClientEvent, Reporter};
use crate::transport::{Connection, Connector};

pub const DEFAULT_BASE_URL: &str = "ws://lnbits-2:5000/api/v1/ws";

/// Configuration for the connection supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Endpoint prefix; the identifier is appended as the last path segment
    pub base_url: String,
    /// Failures tolerated before giving up
    pub max_attempts: u32,
    /// Fixed delay before the next attempt
    pub retry_delay: Duration,
    /// Start counting from zero again after each successful handshake
    pub reset_attempts_on_connect: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: 10,
            retry_delay: Duration::from_secs(5),
            reset_attempts_on_connect: false,
        }
    }
}

/// Where the supervisor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Connecting,
    Connected,
    Failed,
    Exhausted,
}

/// What to do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Exhausted,
}

/// Failed attempts so far against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    attempt_count: u32,
    max_attempts: u32,
}

impl AttemptState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts,
        }
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Count one failure and decide whether another attempt is allowed.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.decision()
    }

    pub fn decision(&self) -> RetryDecision {
        if self.attempt_count < self.max_attempts {
            RetryDecision::Retry
        } else {
            RetryDecision::Exhausted
        }
    }

    pub fn reset(&mut self) {
        self.attempt_count = 0;
    }
}

/// Build the endpoint URL for an identifier.
pub fn endpoint_url(base_url: &str, identifier: &Identifier) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), identifier)
}

/// Owns the retry state machine and the active connection.
pub struct ConnectionSupervisor<C> {
    config: SupervisorConfig,
    connector: C,
    reporter: Arc<dyn Reporter>,
    state: SupervisorState,
    attempts: AttemptState,
    /// The failure that spent the last attempt; set exactly when `Exhausted`
    exhausted_by: Option<TransportError>,
}

impl<C: Connector> ConnectionSupervisor<C> {
    pub fn new(config: SupervisorConfig, connector: C, reporter: Arc<dyn Reporter>) -> Self {
        let attempts = AttemptState::new(config.max_attempts);
        Self {
            config,
            connector,
            reporter,
            state: SupervisorState::Idle,
            attempts,
            exhausted_by: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn attempts(&self) -> AttemptState {
        self.attempts
    }

    /// Keep a connection to the identifier's endpoint open.
    ///
    /// Never returns `Ok`. Returns [`ClientError::RetriesExhausted`] once the
    /// attempt budget is spent; calling it again after that returns the same error
    /// without touching the network.
    pub async fn run(&mut self, identifier: &Identifier) -> Result<Infallible> {
        let url = endpoint_url(&self.config.base_url, identifier);

        loop {
            if let Some(last_error) = &self.exhausted_by {
                return Err(self.exhausted_error(last_error.clone()));
            }

            self.transition(SupervisorState::Connecting);
            self.reporter
                .report(&ClientEvent::Connecting { url: url.clone() });

            let error = match self.connector.connect(&url).await {
                Ok(connection) => {
                    self.transition(SupervisorState::Connected);
                    if self.config.reset_attempts_on_connect {
                        self.attempts.reset();
                    }
                    self.reporter.report(&ClientEvent::Connected {
                        identifier: identifier.clone(),
                    });
                    self.listen(connection).await
                }
                Err(e) => e,
            };

            self.transition(SupervisorState::Failed);
            let decision = self.attempts.record_failure();
            self.reporter.report(&ClientEvent::ConnectionFailed {
                attempt: self.attempts.attempt_count(),
                max_attempts: self.attempts.max_attempts(),
                error: error.clone(),
            });

            match decision {
                RetryDecision::Retry => {
                    self.reporter.report(&ClientEvent::RetryScheduled {
                        delay: self.config.retry_delay,
                    });
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                RetryDecision::Exhausted => {
                    self.transition(SupervisorState::Exhausted);
                    self.reporter.report(&ClientEvent::RetriesExhausted {
                        attempts: self.attempts.attempt_count(),
                    });
                    let err = self.exhausted_error(error.clone());
                    self.exhausted_by = Some(error);
                    return Err(err);
                }
            }
        }
    }

    /// Report every inbound message until the connection ends, then close it.
    async fn listen(&self, mut connection: C::Connection) -> TransportError {
        loop {
            match connection.next_message().await {
                Ok(message) => {
                    self.reporter
                        .report(&ClientEvent::MessageReceived { message });
                }
                Err(e) => {
                    connection.close().await;
                    return e;
                }
            }
        }
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = ?self.state, to = ?next, "Supervisor transition");
        self.state = next;
    }

    fn exhausted_error(&self, last_error: TransportError) -> ClientError {
        ClientError::RetriesExhausted {
            attempts: self.attempts.attempt_count(),
            max_attempts: self.attempts.max_attempts(),
            last_error,
        }
    }
}
