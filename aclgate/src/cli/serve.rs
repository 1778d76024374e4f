//! serve subcommand
//!
//! Starts the service and runs until Ctrl+C / SIGTERM.

use crate::common::error::ServiceError;
use crate::config::{self, ServiceConfig};
use crate::server;
use crate::shutdown::{self, ShutdownController};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// serve subcommand arguments
///
/// Also parsed on its own when the binary runs without a subcommand.
#[derive(Parser, Debug, Clone)]
#[command(name = "serve")]
pub struct ServeArgs {
    /// Listen address
    #[arg(short, long, env = "ACLGATE_LISTEN_ADDR", default_value = config::DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Permission document (JSON); ACLGATE_ACL is used when omitted
    #[arg(short, long, env = "ACLGATE_ACL_FILE")]
    pub acl: Option<PathBuf>,

    /// Per audit-stream queue length
    #[arg(long, env = "ACLGATE_SUBSCRIBER_CAPACITY")]
    pub subscriber_capacity: Option<usize>,

    /// Graceful shutdown window in seconds
    #[arg(long, env = "ACLGATE_SHUTDOWN_GRACE_SECS")]
    pub shutdown_grace_secs: Option<u64>,
}

impl ServeArgs {
    /// Merges flags over environment defaults
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::from_env();
        config.listen_addr = self.listen.clone();
        if let Some(capacity) = self.subscriber_capacity {
            config.subscriber_capacity = capacity;
        }
        if let Some(secs) = self.shutdown_grace_secs {
            config.shutdown_grace = Duration::from_secs(secs);
        }
        config.normalized()
    }
}

/// Runs the service until a shutdown signal arrives
pub async fn execute(args: &ServeArgs) -> Result<(), ServiceError> {
    let document = config::resolve_acl_document(args.acl.as_deref())?;
    let controller = ShutdownController::new();

    let service =
        server::start_with_config(controller.clone(), args.service_config(), &document).await?;

    tokio::spawn(shutdown::wait_for_signal(controller));
    service.wait().await;
    Ok(())
}
