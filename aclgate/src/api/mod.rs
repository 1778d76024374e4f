//! RPC routes
//!
//! Each method is a `POST` route whose path is the full method name, so the
//! path the authorizer sees is exactly what permission patterns match.

/// Admin service streams (`Logging`, `Statistics`)
pub mod admin;

/// Business service stubs
pub mod biz;

/// Error responses
pub mod error;

use crate::authz::middleware::authorize_call;
use crate::AppState;
use axum::{middleware as axum_middleware, routing::post, Router};
use tower_http::trace::TraceLayer;

/// Business service name
pub const BIZ_SERVICE: &str = "main.Biz";
/// Admin service name
pub const ADMIN_SERVICE: &str = "main.Admin";

/// Full method name, `/<service>/<method>`
pub fn method_path(service: &str, method: &str) -> String {
    format!("/{}/{}", service, method)
}

/// Builds the router with the authorizer in front of every method
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(&method_path(BIZ_SERVICE, "Check"), post(biz::check))
        .route(&method_path(BIZ_SERVICE, "Add"), post(biz::add))
        .route(&method_path(BIZ_SERVICE, "Test"), post(biz::test))
        .route(&method_path(ADMIN_SERVICE, "Logging"), post(admin::logging))
        .route(
            &method_path(ADMIN_SERVICE, "Statistics"),
            post(admin::statistics),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.authorizer.clone(),
            authorize_call,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
