use std::{collections::VecDeque, pin::Pin, time::Duration};

use aclgate::{
    cli::tail::drain_frames,
    config::ServiceConfig,
    events::Event,
    server::{self, RunningService},
    shutdown::ShutdownController,
};
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;

/// Permission document shared by most tests
pub const ACL: &str = r#"{
    "alpha":  ["/main.Biz/Check"],
    "gamma":  ["/main.Biz/*"],
    "logger": ["/main.Admin/Logging"],
    "stat":   ["/main.Admin/Statistics"]
}"#;

/// How long a test waits for something that should happen
pub const WAIT: Duration = Duration::from_secs(5);

/// Service settings for tests: ephemeral port, fast keep-alives
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        shutdown_grace: Duration::from_secs(2),
        stream_keepalive: Duration::from_millis(50),
        ..ServiceConfig::default()
    }
}

/// Starts a service with [`ACL`]
pub async fn spawn_service() -> RunningService {
    spawn_service_with(ACL).await
}

/// Starts a service with the given permission document
#[allow(dead_code)]
pub async fn spawn_service_with(acl: &str) -> RunningService {
    server::start_with_config(ShutdownController::new(), test_config(), acl)
        .await
        .expect("service failed to start")
}

/// Base URL of a running service
pub fn base_url(service: &RunningService) -> String {
    format!("http://{}", service.local_addr())
}

/// Sends one unary call
pub async fn call(
    service: &RunningService,
    method: &str,
    consumer: Option<&str>,
) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("{}{}", base_url(service), method))
        .json(&serde_json::json!({}));
    if let Some(consumer) = consumer {
        request = request.header("consumer", consumer);
    }
    request.send().await.expect("request failed")
}

/// Polls the bus until it reports `expected` subscribers
pub async fn wait_for_subscribers(service: &RunningService, expected: usize) {
    tokio::time::timeout(WAIT, async {
        while service.event_bus().subscriber_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("subscriber count never reached {expected}"));
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Client side of an open `Logging` stream
pub struct AuditStream {
    body: ByteStream,
    buffer: String,
    pending: VecDeque<String>,
}

impl AuditStream {
    /// Opens `/main.Admin/Logging` as `consumer`
    ///
    /// Returns once the response head arrived, i.e. after the subscription
    /// was registered.
    pub async fn open(service: &RunningService, consumer: &str) -> Self {
        let response = call(service, "/main.Admin/Logging", Some(consumer)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );
        Self {
            body: Box::pin(response.bytes_stream()),
            buffer: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// Next event, or `None` when the server ended the stream
    ///
    /// Panics if nothing arrives within [`WAIT`].
    pub async fn next_event(&mut self) -> Option<Event> {
        tokio::time::timeout(WAIT, self.read_event())
            .await
            .expect("timed out waiting for audit event")
    }

    /// Returns an event if one arrives within `window`
    pub async fn try_next_event(&mut self, window: Duration) -> Option<Event> {
        tokio::time::timeout(window, self.read_event())
            .await
            .ok()
            .flatten()
    }

    async fn read_event(&mut self) -> Option<Event> {
        loop {
            if let Some(data) = self.pending.pop_front() {
                return Some(serde_json::from_str(&data).expect("invalid audit event"));
            }
            let chunk = match self.body.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(_)) | None => return None,
            };
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
            self.pending.extend(drain_frames(&mut self.buffer));
        }
    }
}
