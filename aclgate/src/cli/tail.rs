//! tail subcommand
//!
//! Opens `/main.Admin/Logging` and prints one JSON line per audit event.

use super::ClientArgs;
use crate::api::{method_path, ADMIN_SERVICE};
use anyhow::{bail, Context};
use clap::Args;
use futures::StreamExt;

/// tail subcommand arguments
#[derive(Args, Debug, Clone)]
pub struct TailArgs {
    /// Server connection flags
    #[command(flatten)]
    pub client: ClientArgs,

    /// Stop after this many events
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Streams audit events to stdout until the server closes the stream
pub async fn execute(args: &TailArgs) -> anyhow::Result<()> {
    let url = args.client.method_url(&method_path(ADMIN_SERVICE, "Logging"));
    let response = reqwest::Client::new()
        .post(&url)
        .header(crate::authz::CONSUMER_METADATA_KEY, &args.client.consumer)
        .json(&serde_json::json!({}))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("audit stream rejected ({}): {}", status, body);
    }

    let mut printed = 0usize;
    let mut buffer = String::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("audit stream interrupted")?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        for data in drain_frames(&mut buffer) {
            println!("{}", data);
            printed += 1;
            if args.limit.is_some_and(|limit| printed >= limit) {
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Removes complete frames from `buffer` and returns their `data:` payloads
///
/// Comment frames (keep-alives) are skipped; an incomplete trailing frame is
/// left in the buffer.
pub fn drain_frames(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(end) = buffer.find("\n\n") {
        let frame: String = buffer.drain(..end + 2).collect();
        let data: Vec<&str> = frame
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim_start)
            .collect();
        if !data.is_empty() {
            payloads.push(data.join("\n"));
        }
    }
    payloads
}
