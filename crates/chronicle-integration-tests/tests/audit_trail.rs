//! End-to-end recording and querying against an in-memory `SurrealDB`.

#![allow(clippy::arithmetic_side_effects)]

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use chronicle_audit::{
    ActorType, AuditAction, AuditBuilder, AuditEntryId, AuditQuery, AuditService, Context,
};
use serde_json::{Value, json};

use common::memory_auditor;

#[tokio::test]
async fn test_login_then_update_scenario() {
    let service = Arc::new(memory_auditor().await);
    let ctx = Context::background();
    let logged_in_at = Utc::now() - Duration::seconds(5);

    AuditBuilder::with_service(service.clone())
        .login()
        .user("u1", "")
        .resource("session", "s1", "")
        .timestamp(logged_in_at)
        .success(true)
        .log(&ctx)
        .await
        .unwrap();

    let history = service
        .get_actor_history(&ctx, "u1", Some(ActorType::User), 10)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    let login = &history[0];
    assert_eq!(login.action, Some(AuditAction::Login));
    assert_eq!(login.actor.id, "u1");
    assert_eq!(login.actor.actor_type, Some(ActorType::User));
    assert_eq!(login.resource.resource_type, "session");
    assert_eq!(login.resource.id, "s1");
    assert!(login.success);

    AuditBuilder::with_service(service.clone())
        .update()
        .user("u1", "")
        .resource("user", "u1", "")
        .add_change("email", "a", "b")
        .add_change("status", "inactive", "active")
        .success(true)
        .log(&ctx)
        .await
        .unwrap();

    let unrelated = service
        .get_resource_history(&ctx, "document", "nope", 0)
        .await
        .unwrap();
    assert!(unrelated.is_empty());

    let result = service
        .get_history(
            &ctx,
            &AuditQuery::new()
                .with_actor_id("u1")
                .with_actions([AuditAction::Login, AuditAction::Update]),
        )
        .await
        .unwrap();
    assert_eq!(result.total, 2);
    assert!(!result.has_more);
    assert_eq!(result.entries[0].action, Some(AuditAction::Update));
    assert_eq!(result.entries[1].action, Some(AuditAction::Login));

    let update = &result.entries[0];
    assert_eq!(update.changes.len(), 2);
    assert_eq!(update.changes[0].field, "email");
    assert_eq!(update.changes[1].field, "status");
    assert_eq!(update.changes[1].new_value, Some(json!("active")));
}

#[tokio::test]
async fn test_builder_defaults_are_persisted() {
    let service = Arc::new(memory_auditor().await);
    let ctx = Context::background();
    let before = Utc::now() - Duration::milliseconds(1);

    let builder = AuditBuilder::with_service(service.clone())
        .view()
        .api("client-7", "Reporting")
        .resource("report", "r1", "Monthly");
    let built = builder.build();
    builder.log(&ctx).await.unwrap();

    let id = built.id.unwrap().to_string();
    let stored = service.get_by_id(&ctx, &id).await.unwrap().unwrap();
    assert_eq!(stored, built);
    let ts = stored.timestamp.unwrap();
    assert!(ts >= before);
    assert!(ts <= Utc::now());
}

#[tokio::test]
async fn test_caller_json_is_returned_unchanged() {
    let service = Arc::new(memory_auditor().await);
    let ctx = Context::background();

    let builder = AuditBuilder::with_service(service.clone())
        .update()
        .user_with_session("u1", "Alice", "s1")
        .resource("profile", "p1", "")
        .add_change("nickname", Value::Null, "ace")
        .add_change("tags", json!(["a", null]), json!([]))
        .metadata("nul", Value::Null)
        .metadata("nested", json!({"limits": {"max": 3, "min": null}, "list": [1, "two", null]}))
        .metadata("flag", false)
        .success(true);
    let built = builder.build();
    builder.log(&ctx).await.unwrap();

    let stored = service
        .get_by_id(&ctx, &built.id.unwrap().to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.metadata, built.metadata);
    assert_eq!(stored.metadata["nul"], Value::Null);
    assert_eq!(stored.changes, built.changes);
    assert_eq!(stored, built);
}

#[tokio::test]
async fn test_missing_id_is_none() {
    let service = memory_auditor().await;
    let found = service
        .get_by_id(&Context::background(), &AuditEntryId::new().to_string())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_failed_outcome_round_trips() {
    let service = Arc::new(memory_auditor().await);
    let ctx = Context::background();
    let attempt: Result<(), String> = Err("permission denied".to_owned());

    AuditBuilder::with_service(service.clone())
        .delete()
        .user("u2", "")
        .resource("document", "d9", "")
        .metadata("reason", "cleanup")
        .outcome(&attempt)
        .log(&ctx)
        .await
        .unwrap();

    let failures = service
        .get_history(&ctx, &AuditQuery::new().with_success(false))
        .await
        .unwrap();
    assert_eq!(failures.total, 1);
    let entry = &failures.entries[0];
    assert_eq!(entry.error_msg.as_deref(), Some("permission denied"));
    assert_eq!(entry.metadata["reason"], "cleanup");
}
