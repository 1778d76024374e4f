//! call subcommand
//!
//! Invokes one unary method and prints the response body.

use super::ClientArgs;
use anyhow::{bail, Context};
use clap::Args;

/// call subcommand arguments
#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Full method name, e.g. /main.Biz/Check
    pub method: String,

    /// Server connection flags
    #[command(flatten)]
    pub client: ClientArgs,
}

/// Sends the call and prints the result
pub async fn execute(args: &CallArgs) -> anyhow::Result<()> {
    let url = args.client.method_url(&args.method);
    let response = reqwest::Client::new()
        .post(&url)
        .header(crate::authz::CONSUMER_METADATA_KEY, &args.client.consumer)
        .json(&serde_json::json!({}))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body = response.text().await.context("failed to read response")?;
    if !status.is_success() {
        bail!("{} failed ({}): {}", args.method, status, body);
    }

    println!("{}", body);
    Ok(())
}
