// Authorization middleware applied to every RPC route

use super::{Authorizer, CallInfo, CONSUMER_METADATA_KEY};
use crate::api::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Authorization middleware
///
/// Reads the consumer from the `consumer` header, the method from the request
/// path and the peer address from `ConnectInfo`, then asks the [`Authorizer`].
/// Streaming routes pass through here once, when the stream is opened.
///
/// # Returns
/// * `Ok(Response)` - authorized; the handler ran with [`super::Consumer`] in
///   the request extensions
/// * `Err(AppError)` - denied; the handler never ran
pub async fn authorize_call(
    State(authorizer): State<Authorizer>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.uri().path().to_string();
    let host = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let consumer = request
        .headers()
        .get(CONSUMER_METADATA_KEY)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let call = CallInfo {
        method: &method,
        consumer: consumer.as_deref(),
        host: &host,
    };

    let consumer = authorizer.authorize(&call).map_err(|e| {
        warn!(method = %method, host = %host, "call rejected: {}", e);
        AppError::from(e)
    })?;

    debug!(consumer = %consumer.as_str(), method = %method, "call authorized");
    request.extensions_mut().insert(consumer);

    Ok(next.run(request).await)
}
