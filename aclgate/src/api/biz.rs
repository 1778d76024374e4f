//! Business service stubs (`main.Biz`)
//!
//! The methods do nothing; they exist so the authorization layer has
//! something to guard.

use crate::authz::Consumer;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Empty message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nothing {}

/// `POST /main.Biz/Check`
pub async fn check(Extension(consumer): Extension<Consumer>) -> Json<Nothing> {
    trace!(consumer = %consumer.as_str(), "Check");
    Json(Nothing {})
}

/// `POST /main.Biz/Add`
pub async fn add(Extension(consumer): Extension<Consumer>) -> Json<Nothing> {
    trace!(consumer = %consumer.as_str(), "Add");
    Json(Nothing {})
}

/// `POST /main.Biz/Test`
pub async fn test(Extension(consumer): Extension<Consumer>) -> Json<Nothing> {
    trace!(consumer = %consumer.as_str(), "Test");
    Json(Nothing {})
}
