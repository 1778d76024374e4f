//! API error responses
//!
//! Common error handling for axum

use crate::common::error::{AuthzError, EventBusError, GateError};
use axum::{response::IntoResponse, Json};

/// Error response type for axum
#[derive(Debug)]
pub struct AppError(pub GateError);

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        AppError(err)
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        AppError(err.into())
    }
}

impl From<EventBusError> for AppError {
    fn from(err: EventBusError) -> Self {
        AppError(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // consumer names and methods are logged by the caller, never returned
        (self.0.status_code(), Json(self.0.to_body())).into_response()
    }
}
