//! Service startup and shutdown
//!
//! [`start_service`] loads the permission map, binds the listener and serves
//! in the background. Once the [`ShutdownController`] fires, the listener
//! stops accepting, in-flight calls finish, and the event bus is shut down
//! so that open audit streams end instead of holding the server open.

use crate::acl::PermissionMap;
use crate::authz::Authorizer;
use crate::common::error::ServiceError;
use crate::config::ServiceConfig;
use crate::events::EventBus;
use crate::shutdown::ShutdownController;
use crate::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Handle to a service started in the background
#[derive(Debug)]
pub struct RunningService {
    local_addr: SocketAddr,
    event_bus: EventBus,
    shutdown: ShutdownController,
    shutdown_grace: Duration,
    handle: JoinHandle<()>,
}

impl RunningService {
    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Event bus of this service
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Cancellation signal of this service
    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Waits for the server to stop
    ///
    /// After shutdown is requested the server gets `shutdown_grace` to drain;
    /// past that it is aborted.
    pub async fn wait(self) {
        let Self {
            shutdown,
            shutdown_grace,
            mut handle,
            ..
        } = self;

        let deadline = async {
            shutdown.wait().await;
            tokio::time::sleep(shutdown_grace).await;
        };

        tokio::select! {
            result = &mut handle => {
                if let Err(e) = result {
                    error!("server task failed: {}", e);
                }
            }
            _ = deadline => {
                warn!(
                    grace_secs = shutdown_grace.as_secs_f64(),
                    "graceful shutdown timed out, aborting server"
                );
                handle.abort();
            }
        }
    }
}

/// Starts the service on `listen_addr` with default settings
pub async fn start_service(
    shutdown: ShutdownController,
    listen_addr: &str,
    acl_document: &str,
) -> Result<RunningService, ServiceError> {
    let config = ServiceConfig {
        listen_addr: listen_addr.to_string(),
        ..ServiceConfig::default()
    };
    start_with_config(shutdown, config, acl_document).await
}

/// Starts the service with explicit settings
///
/// Fails without binding anything if the permission document is malformed.
pub async fn start_with_config(
    shutdown: ShutdownController,
    config: ServiceConfig,
    acl_document: &str,
) -> Result<RunningService, ServiceError> {
    let config = config.normalized();
    let acl = PermissionMap::load(acl_document)?;
    info!(
        consumers = acl.consumer_count(),
        "permission map loaded: {:?}",
        acl.consumers()
    );

    let event_bus = EventBus::new(config.subscriber_capacity);
    let state = AppState {
        authorizer: Authorizer::new(Arc::new(acl), event_bus.clone()),
        event_bus: event_bus.clone(),
        stream_keepalive: config.stream_keepalive,
    };

    let listener = match TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(source) => {
            event_bus.shutdown();
            return Err(ServiceError::Bind {
                addr: config.listen_addr.clone(),
                source,
            });
        }
    };
    let local_addr = listener.local_addr().map_err(|e| {
        event_bus.shutdown();
        ServiceError::LocalAddr(e)
    })?;

    info!("aclgate listening on {}", local_addr);

    let app = crate::api::create_app(state);
    let serve_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { serve_shutdown.wait().await })
        .await;

        match result {
            Ok(()) => info!("Server shutdown complete"),
            Err(e) => error!("Server error: {}", e),
        }
    });

    // audit streams only end when their channels close
    let watcher_bus = event_bus.clone();
    let watcher_shutdown = shutdown.clone();
    tokio::spawn(async move {
        watcher_shutdown.wait().await;
        info!("Shutdown requested, closing audit streams...");
        watcher_bus.shutdown();
    });

    Ok(RunningService {
        local_addr,
        event_bus,
        shutdown,
        shutdown_grace: config.shutdown_grace,
        handle,
    })
}
