//! Consumer permission map
//!
//! Parses the permission document (consumer -> list of method patterns) once
//! at startup. The resulting map is never mutated and is shared across calls
//! as `Arc<PermissionMap>` without locking.

use crate::common::error::ConfigError;
use std::collections::HashMap;

/// Wildcard method segment
const WILDCARD: &str = "*";

/// A single allowed-method pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodPattern {
    /// Exact full method name, e.g. `/main.Biz/Check`
    Exact(String),
    /// Every method of one service, written `/main.Biz/*`
    Service(String),
}

impl MethodPattern {
    /// Parses `/<service>/<method>` or `/<service>/*`
    pub fn parse(raw: &str) -> Option<Self> {
        let (service, method) = split_method(raw)?;
        if method.contains('/') {
            return None;
        }
        if method == WILDCARD {
            Some(Self::Service(service.to_string()))
        } else {
            Some(Self::Exact(raw.to_string()))
        }
    }

    /// Returns true when this pattern covers the full method name
    pub fn matches(&self, full_method: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == full_method,
            Self::Service(service) => split_method(full_method)
                .map(|(s, _)| s == service)
                .unwrap_or(false),
        }
    }
}

/// Splits `/<service>/<method>` into its two non-empty segments
fn split_method(full_method: &str) -> Option<(&str, &str)> {
    let (service, method) = full_method.strip_prefix('/')?.split_once('/')?;
    if service.is_empty() || method.is_empty() {
        return None;
    }
    Some((service, method))
}

/// Immutable mapping from consumer identity to its allowed patterns
#[derive(Debug, Clone, Default)]
pub struct PermissionMap {
    entries: HashMap<String, Vec<MethodPattern>>,
}

impl PermissionMap {
    /// Parses a JSON permission document
    ///
    /// ```json
    /// { "logger": ["/main.Admin/Logging"], "biz_admin": ["/main.Biz/*"] }
    /// ```
    pub fn load(document: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(document)?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (consumer, patterns) in raw {
            let mut parsed: Vec<MethodPattern> = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let Some(p) = MethodPattern::parse(&pattern) else {
                    return Err(ConfigError::InvalidPattern { consumer, pattern });
                };
                // ordered set: keep first occurrence
                if !parsed.contains(&p) {
                    parsed.push(p);
                }
            }
            entries.insert(consumer, parsed);
        }

        Ok(Self { entries })
    }

    /// Returns the patterns of a consumer, if known
    pub fn lookup(&self, consumer: &str) -> Option<&[MethodPattern]> {
        self.entries.get(consumer).map(Vec::as_slice)
    }

    /// Returns true when any pattern covers the method
    pub fn allows(patterns: &[MethodPattern], full_method: &str) -> bool {
        patterns.iter().any(|p| p.matches(full_method))
    }

    /// Number of configured consumers
    pub fn consumer_count(&self) -> usize {
        self.entries.len()
    }

    /// Configured consumer names, sorted
    pub fn consumers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
