//! Logging initialization
//!
//! Level comes from `ACLGATE_LOG_LEVEL` (falling back to `RUST_LOG`, then
//! `info`). `ACLGATE_LOG_FORMAT=json` switches to one JSON object per line.

use crate::config::get_env_with_fallback;
use tracing_subscriber::EnvFilter;

/// Default filter directive
const DEFAULT_LOG_LEVEL: &str = "info";

/// Installs the global tracing subscriber
pub fn init() -> anyhow::Result<()> {
    let directive = get_env_with_fallback("ACLGATE_LOG_LEVEL", "RUST_LOG")
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_new(&directive)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))?;

    let json = std::env::var("ACLGATE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
