//! aclgate
//!
//! Consumer-keyed authorization for every RPC call, plus a live audit stream
//! of call attempts for any number of connected listeners.

#![warn(missing_docs)]

/// Shared types (errors)
pub mod common;

/// Permission map
pub mod acl;

/// Audit event bus
pub mod events;

/// Call authorization and its middleware
pub mod authz;

/// RPC handlers and router
pub mod api;

/// Service startup and shutdown
pub mod server;

/// Cancellation signal
pub mod shutdown;

/// Configuration (environment variables)
pub mod config;

/// Logging initialization
pub mod logging;

/// CLI interface
pub mod cli;

use std::time::Duration;

/// Application state shared by all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Authorizer installed in front of every route
    pub authorizer: authz::Authorizer,
    /// Audit event bus
    pub event_bus: events::EventBus,
    /// Idle keep-alive interval for audit streams
    pub stream_keepalive: Duration,
}
