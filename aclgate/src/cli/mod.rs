//! CLI module for aclgate
//!
//! Provides the server command plus small client commands for calling
//! methods and tailing the audit stream.

pub mod call;
pub mod serve;
pub mod tail;

use clap::{Parser, Subcommand};

/// aclgate - consumer ACL enforcement with a live audit stream
#[derive(Parser, Debug)]
#[command(name = "aclgate")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    ACLGATE_LISTEN_ADDR            Listen address (default: 127.0.0.1:8082)
    ACLGATE_ACL_FILE               Permission document path
    ACLGATE_ACL                    Inline permission document (used when no file is given)
    ACLGATE_SUBSCRIBER_CAPACITY    Per audit-stream queue length (default: 256)
    ACLGATE_SHUTDOWN_GRACE_SECS    Graceful shutdown window (default: 5)
    ACLGATE_STREAM_KEEPALIVE_SECS  Audit stream keep-alive interval (default: 15)
    ACLGATE_LOG_LEVEL              Log filter (default: info, falls back to RUST_LOG)
    ACLGATE_LOG_FORMAT             "json" for JSON log lines
    ACLGATE_ADDR                   Server URL for client commands
    ACLGATE_CONSUMER               Consumer identity for client commands
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the service
    Serve(serve::ServeArgs),
    /// Invoke a unary method
    Call(call::CallArgs),
    /// Print audit events as they happen
    Tail(tail::TailArgs),
}

/// Client connection flags shared by `call` and `tail`
#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// Server base URL
    #[arg(long, default_value = "http://127.0.0.1:8082", env = "ACLGATE_ADDR")]
    pub addr: String,

    /// Consumer identity sent in call metadata
    #[arg(short, long, env = "ACLGATE_CONSUMER")]
    pub consumer: String,
}

impl ClientArgs {
    /// Full URL of a method
    pub fn method_url(&self, method: &str) -> String {
        let method = if method.starts_with('/') {
            method.to_string()
        } else {
            format!("/{}", method)
        };
        format!("{}{}", self.addr.trim_end_matches('/'), method)
    }
}
