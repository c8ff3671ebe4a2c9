//! Argument parsing and defaults integration tests

use std::time::Duration;

use clap::Parser;
use switch_presence::{config::LogFormat, Args};

/// Default flags match the documented client behaviour.
#[test]
fn test_default_args() {
    let args = Args::try_parse_from(["switch-presence"]).expect("defaults parse");
    args.validate().expect("defaults are valid");

    let supervisor = args.supervisor_config();
    assert_eq!(supervisor.base_url, "ws://lnbits-2:5000/api/v1/ws");
    assert_eq!(supervisor.max_attempts, 10);
    assert_eq!(supervisor.retry_delay, Duration::from_secs(5));
    assert!(!supervisor.reset_attempts_on_connect);

    let resolver = args.resolver_config();
    assert_eq!(resolver.var, "SWITCH_ID");
    assert_eq!(resolver.poll_interval, Duration::from_secs(2));
    assert_eq!(resolver.max_polls, 30);
    assert_eq!(resolver.ceiling(), Duration::from_secs(60));

    assert_eq!(args.log_format, LogFormat::Text);
    assert!(args.env_file.is_none());
}

#[test]
fn test_json_log_format() {
    let args = Args::try_parse_from(["switch-presence", "--log-format", "json"]).unwrap();
    assert_eq!(args.log_format, LogFormat::Json);
}

#[test]
fn test_unknown_log_format_rejected() {
    assert!(Args::try_parse_from(["switch-presence", "--log-format", "xml"]).is_err());
}

#[test]
fn test_env_file_path() {
    let args =
        Args::try_parse_from(["switch-presence", "--env-file", "/run/switch/id.env"]).unwrap();
    assert_eq!(
        args.env_file.as_deref(),
        Some(std::path::Path::new("/run/switch/id.env"))
    );
}
