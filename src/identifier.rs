//! Identifier resolution
//!
//! The switch ID names the endpoint path segment. It normally comes from the
//! environment, but containers sometimes get it injected late, so the resolver
//! waits for it with a bounded poll instead of failing on the first read.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{ClientError, Result};
use crate::report::{ClientEvent, Reporter};

/// Opaque, non-empty endpoint identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Trims surrounding whitespace; `None` if nothing is left.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where identifier values are read from.
pub trait IdentifierSource {
    fn lookup(&self, var: &str) -> Option<String>;
}

impl<F> IdentifierSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, var: &str) -> Option<String> {
        self(var)
    }
}

/// Reads the process environment, falling back to an env file.
///
/// The file is re-read on every lookup, so it may appear after startup.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    env_file: Option<PathBuf>,
}

impl EnvSource {
    pub fn new(env_file: Option<PathBuf>) -> Self {
        Self { env_file }
    }

    fn lookup_file(&self, var: &str) -> Option<String> {
        let path = self.env_file.as_ref()?;
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Env file not readable yet");
                return None;
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .find(|(key, _)| key == var)
            .map(|(_, value)| value)
    }
}

impl IdentifierSource for EnvSource {
    fn lookup(&self, var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.lookup_file(var))
    }
}

/// Polling parameters for [`IdentifierResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Name of the variable holding the identifier
    pub var: String,
    /// Sleep between reads once the first read came back empty
    pub poll_interval: Duration,
    /// Reads after the first one before giving up
    pub max_polls: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            var: "SWITCH_ID".to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 30,
        }
    }
}

impl ResolverConfig {
    /// Total time spent sleeping before the resolver gives up.
    pub fn ceiling(&self) -> Duration {
        self.poll_interval * self.max_polls
    }
}

pub struct IdentifierResolver<S> {
    config: ResolverConfig,
    source: S,
}

impl<S: IdentifierSource> IdentifierResolver<S> {
    pub fn new(config: ResolverConfig, source: S) -> Self {
        Self { config, source }
    }

    /// Resolve the identifier, waiting up to [`ResolverConfig::ceiling`] for it.
    ///
    /// Returns as soon as a non-empty value is read; an immediately available
    /// value costs no sleep at all.
    pub async fn resolve(&self, reporter: &dyn Reporter) -> Result<Identifier> {
        if let Some(identifier) = self.read() {
            return Ok(identifier);
        }

        reporter.report(&ClientEvent::WaitingForIdentifier {
            var: self.config.var.clone(),
        });

        for poll in 1..=self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;

            if let Some(identifier) = self.read() {
                reporter.report(&ClientEvent::IdentifierResolved {
                    identifier: identifier.clone(),
                    waited: self.config.poll_interval * poll,
                });
                return Ok(identifier);
            }
            debug!(poll, max_polls = self.config.max_polls, "Identifier still missing");
        }

        let waited = self.config.ceiling();
        reporter.report(&ClientEvent::IdentifierMissing {
            var: self.config.var.clone(),
            waited,
        });
        Err(ClientError::ConfigurationMissing {
            var: self.config.var.clone(),
            waited,
        })
    }

    fn read(&self) -> Option<Identifier> {
        self.source.lookup(&self.config.var).and_then(Identifier::new)
    }
}
