//! Audit stream fan-out over real HTTP

use crate::support::{call, spawn_service, wait_for_subscribers, AuditStream};
use std::time::Duration;

#[tokio::test]
async fn test_two_listeners_receive_identical_events() {
    let service = spawn_service().await;
    let mut first = AuditStream::open(&service, "logger").await;
    let mut second = AuditStream::open(&service, "logger").await;

    // opening the second stream is itself an audited call, seen only by the
    // listener that was already connected
    let opened = first.next_event().await.unwrap();
    assert_eq!(opened.consumer, "logger");
    assert_eq!(opened.method, "/main.Admin/Logging");

    call(&service, "/main.Biz/Check", Some("alpha")).await;

    let a = first.next_event().await.unwrap();
    let b = second.next_event().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.method, "/main.Biz/Check");
    assert_eq!(a.consumer, "alpha");
}

#[tokio::test]
async fn test_events_before_subscribe_are_not_replayed() {
    let service = spawn_service().await;

    call(&service, "/main.Biz/Check", Some("alpha")).await;
    call(&service, "/main.Biz/Add", Some("gamma")).await;

    let mut audit = AuditStream::open(&service, "logger").await;
    assert!(audit.try_next_event(Duration::from_millis(200)).await.is_none());
}

#[tokio::test]
async fn test_events_arrive_in_call_order() {
    let service = spawn_service().await;
    let mut audit = AuditStream::open(&service, "logger").await;

    let methods = ["/main.Biz/Check", "/main.Biz/Add", "/main.Biz/Test"];
    for method in methods {
        call(&service, method, Some("gamma")).await;
    }

    for method in methods {
        assert_eq!(audit.next_event().await.unwrap().method, method);
    }
}

#[tokio::test]
async fn test_client_disconnect_releases_subscription() {
    let service = spawn_service().await;
    let audit = AuditStream::open(&service, "logger").await;
    wait_for_subscribers(&service, 1).await;

    drop(audit);
    wait_for_subscribers(&service, 0).await;

    // publishing with no listeners left is harmless
    let res = call(&service, "/main.Biz/Check", Some("alpha")).await;
    assert!(res.status().is_success());
}
