//! Startup and shutdown behaviour

use crate::support::{spawn_service, test_config, AuditStream, WAIT};
use aclgate::common::error::{ConfigError, ServiceError};
use aclgate::server;
use aclgate::shutdown::ShutdownController;

#[tokio::test]
async fn test_shutdown_ends_open_audit_streams() {
    let service = spawn_service().await;
    let mut audit = AuditStream::open(&service, "logger").await;

    service.shutdown_controller().request_shutdown();

    assert!(audit.next_event().await.is_none());
    tokio::time::timeout(WAIT, service.wait())
        .await
        .expect("service did not stop");
}

#[tokio::test]
async fn test_malformed_acl_aborts_startup() {
    let err = server::start_with_config(ShutdownController::new(), test_config(), "not json")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Config(ConfigError::Malformed(_))));
}

#[tokio::test]
async fn test_invalid_pattern_aborts_startup() {
    let err = server::start_with_config(
        ShutdownController::new(),
        test_config(),
        r#"{"alpha": ["Check"]}"#,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Config(ConfigError::InvalidPattern { .. })
    ));
}
