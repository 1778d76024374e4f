//! Error type definitions
//!
//! Unified error types (thiserror).
//!
//! # Status classes
//!
//! Every error that reaches a caller maps onto an RPC-style status class via
//! `status_class()` and onto an HTTP status via `status_code()`. The wire body
//! is `{"error": <external message>, "code": <class>}`.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Permission document error (fatal at startup)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not a JSON object of consumer -> pattern list
    #[error("malformed permission document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A pattern is neither `/<service>/<method>` nor `/<service>/*`
    #[error("invalid method pattern {pattern:?} for consumer {consumer:?}")]
    InvalidPattern {
        /// Consumer owning the pattern
        consumer: String,
        /// Offending pattern
        pattern: String,
    },

    /// The permission file could not be read
    #[error("failed to read permission file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No permission document was configured
    #[error("no permission document configured (set --acl, ACLGATE_ACL_FILE or ACLGATE_ACL)")]
    Missing,
}

/// Authorization failure for a single call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// The call carries no consumer identity
    #[error("missing consumer metadata")]
    MissingMetadata,

    /// The consumer is not present in the permission map
    #[error("unknown consumer: {0}")]
    UnknownConsumer(String),

    /// The consumer is known but the method is not covered
    #[error("method {method} is not allowed for consumer {consumer}")]
    MethodDenied {
        /// Calling consumer
        consumer: String,
        /// Full method name
        method: String,
    },
}

/// Event bus error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventBusError {
    /// The bus owner task has stopped (after shutdown)
    #[error("event bus is closed")]
    Closed,
}

/// Forwarding an event to one audit stream client failed
#[derive(Debug, Error)]
#[error("failed to deliver audit event to subscriber {subscriber_id}")]
pub struct StreamDeliveryError {
    /// Subscriber whose stream is terminated
    pub subscriber_id: u64,
}

/// Service startup error
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Permission document could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested listen address
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The listen address could not be resolved from the bound socket
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Errors surfaced to RPC callers
#[derive(Debug, Error)]
pub enum GateError {
    /// Authorization failure
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Event bus unavailable
    #[error(transparent)]
    EventBus(#[from] EventBusError),

    /// Request body could not be decoded
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GateError {
    /// Returns a safe message for external clients.
    ///
    /// Consumer names and method paths stay in server logs only.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Authz(AuthzError::MissingMetadata) => "failed to get metadata",
            Self::Authz(AuthzError::UnknownConsumer(_)) => "unknown consumer",
            Self::Authz(AuthzError::MethodDenied { .. }) => "method is not allowed",
            Self::EventBus(EventBusError::Closed) => "service is shutting down",
            Self::InvalidRequest(_) => "invalid request",
        }
    }

    /// Returns the RPC status class string.
    ///
    /// - `invalid_argument`: metadata or body problems
    /// - `unauthenticated`: unknown consumer or method not permitted
    /// - `unavailable`: service is shutting down
    pub fn status_class(&self) -> &'static str {
        match self {
            Self::Authz(AuthzError::MissingMetadata) | Self::InvalidRequest(_) => {
                "invalid_argument"
            }
            Self::Authz(_) => "unauthenticated",
            Self::EventBus(_) => "unavailable",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authz(AuthzError::MissingMetadata) | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Authz(_) => StatusCode::UNAUTHORIZED,
            Self::EventBus(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Converts this error into its wire body.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.external_message().to_string(),
            code: self.status_class().to_string(),
        }
    }
}

/// Error response body
///
/// ```json
/// { "error": "unknown consumer", "code": "unauthenticated" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Status class
    pub code: String,
}
