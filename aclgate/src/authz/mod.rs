//! Call authorization
//!
//! Every call is checked against the permission map before its handler runs.
//! A call from a recognized consumer is audited on the event bus even when it
//! ends up denied.

/// axum middleware wrapping every RPC route
pub mod middleware;

use crate::acl::PermissionMap;
use crate::common::error::AuthzError;
use crate::events::{Event, EventBus};
use std::sync::Arc;

/// Metadata key carrying the consumer identity
pub const CONSUMER_METADATA_KEY: &str = "consumer";

/// What the authorizer needs to know about one call
#[derive(Debug, Clone, Copy)]
pub struct CallInfo<'a> {
    /// Full method name, `/<service>/<method>`
    pub method: &'a str,
    /// Consumer identity from call metadata
    pub consumer: Option<&'a str>,
    /// Peer address, empty when unknown
    pub host: &'a str,
}

/// Authorized consumer, attached to the request for handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer(pub String);

impl Consumer {
    /// Consumer name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ACL check plus audit publishing
#[derive(Clone, Debug)]
pub struct Authorizer {
    acl: Arc<PermissionMap>,
    bus: EventBus,
}

impl Authorizer {
    /// Creates an authorizer over a loaded permission map
    pub fn new(acl: Arc<PermissionMap>, bus: EventBus) -> Self {
        Self { acl, bus }
    }

    /// Decides whether the call may proceed
    ///
    /// 1. no consumer metadata -> `MissingMetadata`
    /// 2. consumer not in the map -> `UnknownConsumer` (nothing published)
    /// 3. publish the audit event
    /// 4. method not covered -> `MethodDenied`
    pub fn authorize(&self, call: &CallInfo<'_>) -> Result<Consumer, AuthzError> {
        let consumer = call
            .consumer
            .filter(|c| !c.is_empty())
            .ok_or(AuthzError::MissingMetadata)?;

        let patterns = self
            .acl
            .lookup(consumer)
            .ok_or_else(|| AuthzError::UnknownConsumer(consumer.to_string()))?;

        self.bus.notify(Event::new(consumer, call.method, call.host));

        if !PermissionMap::allows(patterns, call.method) {
            return Err(AuthzError::MethodDenied {
                consumer: consumer.to_string(),
                method: call.method.to_string(),
            });
        }

        Ok(Consumer(consumer.to_string()))
    }

    /// Event bus the authorizer publishes to
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }
}
