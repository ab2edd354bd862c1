//! The process-wide default service.
//!
//! One test in its own binary: the default is process-wide state.

mod common;

use std::sync::Arc;

use chronicle_audit::{AuditBuilder, AuditError, AuditQuery, AuditService, Context, global};
use chronicle_test::login_entry;

use common::mock_auditor;

#[tokio::test]
async fn test_default_service_lifecycle() {
    let ctx = Context::background();

    assert!(global::default_service().is_none());
    let err = global::log_action(&ctx, login_entry("u1")).await.unwrap_err();
    assert!(matches!(err, AuditError::NotConfigured));
    assert!(!AuditBuilder::new().is_bound());

    let (service, repo) = mock_auditor();
    let service: Arc<dyn AuditService> = Arc::new(service);
    assert!(global::set_default_service(service).is_none());

    global::log_action(&ctx, login_entry("u1")).await.unwrap();
    AuditBuilder::new()
        .logout()
        .user("u1", "")
        .resource("session", "u1-session", "")
        .log(&ctx)
        .await
        .unwrap();

    let history = global::get_history(&ctx, &AuditQuery::new().with_actor_id("u1"))
        .await
        .unwrap();
    assert_eq!(history.total, 2);
    let actor = global::get_actor_history(&ctx, "u1", None, 1).await.unwrap();
    assert_eq!(actor.len(), 1);
    let resource = global::get_resource_history(&ctx, "session", "u1-session", 0)
        .await
        .unwrap();
    assert_eq!(resource.len(), 2);
    let id = history.entries[0].id.unwrap().to_string();
    assert!(global::get_by_id(&ctx, &id).await.unwrap().is_some());

    global::shutdown(&ctx).await.unwrap();
    assert!(repo.is_closed());
    assert!(global::default_service().is_none());
    global::shutdown(&ctx).await.unwrap();

    let err = AuditBuilder::new()
        .login()
        .user("u1", "")
        .resource("session", "s", "")
        .log(&ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::NotConfigured));

    global::initialize_with_defaults("mem://", "audit").await.unwrap();
    let history = global::get_history(&ctx, &AuditQuery::new()).await.unwrap();
    assert_eq!(history.total, 0);
    global::shutdown(&ctx).await.unwrap();
}
