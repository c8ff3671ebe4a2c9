//! switch-presence - simulated Bitcoin Switch presence
//!
//! Holds a websocket open to `<base-url>/<switch-id>` so the server sees the
//! switch as connected. Inbound messages are logged, never interpreted.
//!
//! ## Components
//!
//! - **Identifier**: waits a bounded time for the switch ID to show up
//! - **Supervisor**: connect, listen, reconnect with a fixed delay, give up after
//!   a bounded number of failures
//! - **Transport**: tokio-tungstenite behind the `Connector` / `Connection` traits
//! - **Report**: lifecycle events and the `tracing` sink they go to

pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod report;
pub mod supervisor;
pub mod transport;

pub use config::Args;
pub use error::{ClientError, Result, TransportError};
pub use identifier::{EnvSource, Identifier, IdentifierResolver, IdentifierSource, ResolverConfig};
pub use report::{ClientEvent, Reporter, TracingReporter};
pub use supervisor::{ConnectionSupervisor, SupervisorConfig, SupervisorState};
pub use transport::{Connection, Connector, InboundMessage, WsConnector};
