//! Configuration via environment variables and CLI flags
//!
//! Every setting has an `ACLGATE_*` environment variable; `serve` flags take
//! precedence over the environment.

use crate::common::error::ConfigError;
use crate::events::DEFAULT_SUBSCRIBER_CAPACITY;
use std::path::Path;
use std::time::Duration;

/// Default listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8082";
/// Default graceful shutdown window
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;
/// Default idle keep-alive interval for audit streams
pub const DEFAULT_STREAM_KEEPALIVE_SECS: u64 = 15;

/// Inline permission document variable
pub const ACL_DOCUMENT_ENV: &str = "ACLGATE_ACL";

/// Get an environment variable with fallback to a second name
///
/// If the primary variable is set, returns its value; otherwise the fallback
/// (typically a conventional name such as `RUST_LOG`).
///
/// # Example
/// ```
/// use aclgate::config::get_env_with_fallback;
///
/// let level = get_env_with_fallback("ACLGATE_LOG_LEVEL", "RUST_LOG");
/// ```
pub fn get_env_with_fallback(name: &str, fallback: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .or_else(|| std::env::var(fallback).ok())
}

/// Get an environment variable parsed to a specific type
///
/// Returns `default` when the variable is unset or does not parse.
pub fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value {:?} for {}", raw, name);
            default
        }),
        Err(_) => default,
    }
}

/// Service runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Address to bind
    pub listen_addr: String,
    /// Queue length of every audit subscriber
    pub subscriber_capacity: usize,
    /// Time allowed for in-flight calls after shutdown is requested
    pub shutdown_grace: Duration,
    /// Idle interval after which an audit stream sends a keep-alive frame
    pub stream_keepalive: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            stream_keepalive: Duration::from_secs(DEFAULT_STREAM_KEEPALIVE_SECS),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let listen_addr = std::env::var("ACLGATE_LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let subscriber_capacity =
            get_env_parse("ACLGATE_SUBSCRIBER_CAPACITY", DEFAULT_SUBSCRIBER_CAPACITY);
        let grace_secs = get_env_parse("ACLGATE_SHUTDOWN_GRACE_SECS", DEFAULT_SHUTDOWN_GRACE_SECS);
        let keepalive_secs = get_env_parse(
            "ACLGATE_STREAM_KEEPALIVE_SECS",
            DEFAULT_STREAM_KEEPALIVE_SECS,
        );

        Self {
            listen_addr,
            subscriber_capacity,
            shutdown_grace: Duration::from_secs(grace_secs),
            stream_keepalive: Duration::from_secs(keepalive_secs),
        }
        .normalized()
    }

    /// Clamps values that would make the service unusable
    pub fn normalized(mut self) -> Self {
        self.subscriber_capacity = self.subscriber_capacity.max(1);
        if self.stream_keepalive.is_zero() {
            self.stream_keepalive = Duration::from_secs(DEFAULT_STREAM_KEEPALIVE_SECS);
        }
        self
    }
}

/// Resolves the permission document text
///
/// A file path wins; otherwise the inline `ACLGATE_ACL` variable is used.
pub fn resolve_acl_document(file: Option<&Path>) -> Result<String, ConfigError> {
    if let Some(path) = file {
        return std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        });
    }
    std::env::var(ACL_DOCUMENT_ENV).map_err(|_| ConfigError::Missing)
}
