//! Authorization outcomes over real HTTP

use crate::support::{call, spawn_service, AuditStream};
use aclgate::common::error::ErrorBody;
use reqwest::StatusCode;
use std::time::Duration;

#[tokio::test]
async fn test_permitted_call_succeeds() {
    let service = spawn_service().await;

    let res = call(&service, "/main.Biz/Check", Some("alpha")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({}));
}

#[tokio::test]
async fn test_denied_method_is_unauthenticated_and_audited() {
    let service = spawn_service().await;
    let mut audit = AuditStream::open(&service, "logger").await;

    let res = call(&service, "/main.Biz/Add", Some("alpha")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.code, "unauthenticated");
    assert_eq!(body.error, "method is not allowed");

    let event = audit.next_event().await.unwrap();
    assert_eq!(event.consumer, "alpha");
    assert_eq!(event.method, "/main.Biz/Add");
    assert!(event.host.starts_with("127.0.0.1:"), "host {}", event.host);
    assert!(audit.try_next_event(Duration::from_millis(200)).await.is_none());
}

#[tokio::test]
async fn test_unknown_consumer_is_rejected_without_audit() {
    let service = spawn_service().await;
    let mut audit = AuditStream::open(&service, "logger").await;

    let res = call(&service, "/main.Biz/Check", Some("beta")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "unknown consumer");

    // the next audited call is the first thing on the stream
    call(&service, "/main.Biz/Check", Some("alpha")).await;
    let event = audit.next_event().await.unwrap();
    assert_eq!(event.consumer, "alpha");
}

#[tokio::test]
async fn test_missing_consumer_is_invalid_argument() {
    let service = spawn_service().await;

    let res = call(&service, "/main.Biz/Check", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.code, "invalid_argument");
}

#[tokio::test]
async fn test_wildcard_consumer_calls_every_biz_method() {
    let service = spawn_service().await;

    for method in ["/main.Biz/Check", "/main.Biz/Add", "/main.Biz/Test"] {
        let res = call(&service, method, Some("gamma")).await;
        assert_eq!(res.status(), StatusCode::OK, "{method}");
    }

    // the wildcard does not reach another service
    let res = call(&service, "/main.Admin/Logging", Some("gamma")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_statistics_stream_ends_immediately() {
    let service = spawn_service().await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/main.Admin/Statistics", service.local_addr()))
        .header("consumer", "stat")
        .json(&serde_json::json!({ "interval_seconds": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = tokio::time::timeout(Duration::from_secs(5), res.bytes())
        .await
        .unwrap()
        .unwrap();
    assert!(body.is_empty());
}
