//! Test fixtures for common types.

use chrono::{DateTime, Utc};
use chronicle_audit::{
    Actor, ActorType, AuditAction, AuditEntry, AuditEntryId, AuditResource, FieldChange,
};
use chronicle_config::StoreConfig;
use serde_json::json;

/// In-memory store settings with a short retry delay.
#[must_use]
pub fn test_store_config() -> StoreConfig {
    StoreConfig {
        retry_delay_ms: 10,
        ..StoreConfig::in_memory()
    }
}

/// A successful entry without id or timestamp.
#[must_use]
pub fn test_entry(
    action: AuditAction,
    actor_id: &str,
    actor_type: ActorType,
    resource_type: &str,
    resource_id: &str,
) -> AuditEntry {
    AuditEntry::new(
        action,
        Actor::new(actor_id, actor_type),
        AuditResource::new(resource_type, resource_id),
    )
}

/// A user login on the user's own session resource.
#[must_use]
pub fn login_entry(user_id: &str) -> AuditEntry {
    let session = format!("{user_id}-session");
    let mut entry = test_entry(AuditAction::Login, user_id, ActorType::User, "session", &session);
    entry.actor.session_id = Some(session);
    entry
}

/// The same entry with an id and a fixed timestamp.
#[must_use]
pub fn stamped(mut entry: AuditEntry, timestamp: DateTime<Utc>) -> AuditEntry {
    entry.id = Some(AuditEntryId::new());
    entry.timestamp = Some(timestamp);
    entry
}

/// `count` entries by `actor_id`, one second apart starting at `start`,
/// oldest first. Entry `i` is on resource `doc-{i}`.
#[must_use]
pub fn entry_series(actor_id: &str, start: DateTime<Utc>, count: u32) -> Vec<AuditEntry> {
    (0..count)
        .map(|i| {
            let at = start
                .checked_add_signed(chrono::Duration::seconds(i64::from(i)))
                .unwrap_or(start);
            stamped(
                test_entry(
                    AuditAction::View,
                    actor_id,
                    ActorType::User,
                    "document",
                    &format!("doc-{i}"),
                ),
                at,
            )
        })
        .collect()
}

/// An admin activating a user account, with one field change.
#[must_use]
pub fn update_entry(admin_id: &str, user_id: &str) -> AuditEntry {
    let mut entry = test_entry(AuditAction::Update, admin_id, ActorType::Admin, "user", user_id);
    entry.changes.push(FieldChange {
        field: "status".to_owned(),
        old_value: Some(json!("pending")),
        new_value: Some(json!("active")),
    });
    entry
        .metadata
        .insert("reason".to_owned(), json!("account_activation"));
    entry
}
