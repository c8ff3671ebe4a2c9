//! Configuration for switch-presence
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{ClientError, Result};
use crate::identifier::ResolverConfig;
use crate::supervisor::{SupervisorConfig, DEFAULT_BASE_URL};

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// switch-presence - keeps a simulated Bitcoin Switch connected
#[derive(Parser, Debug, Clone)]
#[command(name = "switch-presence")]
#[command(about = "Simulates a Bitcoin Switch device by holding its websocket open")]
pub struct Args {
    /// Base websocket URL; the switch ID is appended as the last path segment
    #[arg(long, env = "SWITCH_WS_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Environment variable holding the switch ID
    #[arg(long, env = "SWITCH_ID_VAR", default_value = "SWITCH_ID")]
    pub id_var: String,

    /// Env file consulted on every poll when the variable is not in the environment
    #[arg(long, env = "SWITCH_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Seconds between reads while waiting for the switch ID
    #[arg(long, env = "SWITCH_ID_POLL_INTERVAL_SECS", default_value = "2")]
    pub id_poll_interval_secs: u64,

    /// Reads after the first before giving up on the switch ID
    #[arg(long, env = "SWITCH_ID_MAX_POLLS", default_value = "30")]
    pub id_max_polls: u32,

    /// Seconds to wait before reconnecting
    #[arg(long, env = "SWITCH_RETRY_DELAY_SECS", default_value = "5")]
    pub retry_delay_secs: u64,

    /// Connection failures tolerated before exiting
    #[arg(long, env = "SWITCH_MAX_ATTEMPTS", default_value = "10")]
    pub max_attempts: u32,

    /// Reset the failure count after every successful connection
    #[arg(long, env = "SWITCH_RESET_ATTEMPTS_ON_CONNECT", default_value = "false")]
    pub reset_attempts_on_connect: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ClientError::InvalidConfig(format!(
                "SWITCH_WS_URL must start with ws:// or wss://, got {}",
                self.url
            )));
        }

        if self.id_var.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "SWITCH_ID_VAR must not be empty".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "SWITCH_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.id_max_polls == 0 {
            return Err(ClientError::InvalidConfig(
                "SWITCH_ID_MAX_POLLS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            var: self.id_var.clone(),
            poll_interval: Duration::from_secs(self.id_poll_interval_secs),
            max_polls: self.id_max_polls,
        }
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            base_url: self.url.clone(),
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            reset_attempts_on_connect: self.reset_attempts_on_connect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("switch-presence").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_rejects_non_websocket_url() {
        let args = parse(&["--url", "http://host:5000/api/v1/ws"]);
        assert!(matches!(
            args.validate(),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_budgets() {
        assert!(parse(&["--max-attempts", "0"]).validate().is_err());
        assert!(parse(&["--id-max-polls", "0"]).validate().is_err());
    }

    #[test]
    fn test_derived_configs() {
        let args = parse(&[
            "--url",
            "wss://switch.example/api/v1/ws",
            "--retry-delay-secs",
            "1",
            "--max-attempts",
            "3",
            "--reset-attempts-on-connect",
            "--id-var",
            "BITCOIN_SWITCH_ID",
        ]);
        args.validate().unwrap();

        let supervisor = args.supervisor_config();
        assert_eq!(supervisor.base_url, "wss://switch.example/api/v1/ws");
        assert_eq!(supervisor.retry_delay, Duration::from_secs(1));
        assert_eq!(supervisor.max_attempts, 3);
        assert!(supervisor.reset_attempts_on_connect);

        let resolver = args.resolver_config();
        assert_eq!(resolver.var, "BITCOIN_SWITCH_ID");
    }
}
