//! Stored form of an audit entry.
//!
//! The record id of each row is `table:⟨entry id⟩`; the entry id is also
//! kept in the `entry_id` field so rows can be read back with the record id
//! omitted. Timestamps are stored as fixed-width RFC 3339 UTC strings with
//! microsecond precision, so string order is time order. `type` is a
//! reserved word in `SurrealQL`, so nested kinds are stored as `kind`.
//!
//! Metadata values and change values are caller-defined JSON. They are
//! stored as JSON text: a bound `null` would otherwise become `NONE` in the
//! store and the key would disappear.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::{
    Actor, ActorType, AuditAction, AuditEntry, AuditEntryId, AuditResource, FieldChange,
};
use crate::error::{AuditError, AuditResult};

/// Format a timestamp the way it is stored and compared.
///
/// Fixed width only for years 0000 to 9999; validation rejects others.
#[must_use]
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> AuditResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AuditError::Serialization(format!("invalid stored timestamp {s:?}: {e}")))
}

fn encode(value: &Value) -> AuditResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode(text: &str) -> AuditResult<Value> {
    serde_json::from_str(text)
        .map_err(|e| AuditError::Serialization(format!("invalid stored JSON value: {e}")))
}

/// Stored field change; values are JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDocument {
    /// Field name.
    pub field: String,
    /// Previous value as JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    /// New value as JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl ChangeDocument {
    fn from_change(change: &FieldChange) -> AuditResult<Self> {
        Ok(Self {
            field: change.field.clone(),
            old_value: change.old_value.as_ref().map(encode).transpose()?,
            new_value: change.new_value.as_ref().map(encode).transpose()?,
        })
    }

    fn into_change(self) -> AuditResult<FieldChange> {
        Ok(FieldChange {
            field: self.field,
            old_value: self.old_value.as_deref().map(decode).transpose()?,
            new_value: self.new_value.as_deref().map(decode).transpose()?,
        })
    }
}

/// Stored actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDocument {
    /// Actor identifier.
    pub id: String,
    /// Actor type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActorType>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Session identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Stored resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDocument {
    /// Resource type.
    pub kind: String,
    /// Resource identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One stored audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDocument {
    /// Entry id (UUID text).
    pub entry_id: String,
    /// RFC 3339 UTC timestamp, microsecond precision.
    pub timestamp: String,
    /// Action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AuditAction>,
    /// Actor.
    pub actor: ActorDocument,
    /// Resource.
    pub resource: ResourceDocument,
    /// Field changes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeDocument>,
    /// Free-form metadata, each value as JSON text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Client address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Outcome.
    #[serde(default)]
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl EntryDocument {
    /// Convert an entry whose `id` and `timestamp` are set.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] if either is missing or a value
    /// cannot be encoded.
    pub fn from_entry(entry: &AuditEntry) -> AuditResult<Self> {
        let id = entry
            .id
            .ok_or_else(|| AuditError::Serialization("entry has no id".to_owned()))?;
        let timestamp = entry
            .timestamp
            .ok_or_else(|| AuditError::Serialization("entry has no timestamp".to_owned()))?;

        Ok(Self {
            entry_id: id.to_string(),
            timestamp: format_timestamp(&timestamp),
            action: entry.action,
            actor: ActorDocument {
                id: entry.actor.id.clone(),
                kind: entry.actor.actor_type,
                name: entry.actor.name.clone(),
                session_id: entry.actor.session_id.clone(),
            },
            resource: ResourceDocument {
                kind: entry.resource.resource_type.clone(),
                id: entry.resource.id.clone(),
                name: entry.resource.name.clone(),
            },
            changes: entry
                .changes
                .iter()
                .map(ChangeDocument::from_change)
                .collect::<AuditResult<_>>()?,
            metadata: entry
                .metadata
                .iter()
                .map(|(key, value)| encode(value).map(|text| (key.clone(), text)))
                .collect::<AuditResult<_>>()?,
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            success: entry.success,
            error_msg: entry.error_msg.clone(),
        })
    }

    /// Convert back into the domain entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] if the stored id, timestamp or
    /// a JSON value is malformed.
    pub fn into_entry(self) -> AuditResult<AuditEntry> {
        let id = AuditEntryId::parse(&self.entry_id).map_err(|e| {
            AuditError::Serialization(format!("invalid stored entry id: {e}"))
        })?;
        let timestamp = parse_timestamp(&self.timestamp)?;
        let changes = self
            .changes
            .into_iter()
            .map(ChangeDocument::into_change)
            .collect::<AuditResult<_>>()?;
        let metadata = self
            .metadata
            .into_iter()
            .map(|(key, text)| decode(&text).map(|value| (key, value)))
            .collect::<AuditResult<_>>()?;

        Ok(AuditEntry {
            id: Some(id),
            timestamp: Some(timestamp),
            action: self.action,
            actor: Actor {
                id: self.actor.id,
                actor_type: self.actor.kind,
                name: self.actor.name,
                session_id: self.actor.session_id,
            },
            resource: AuditResource {
                resource_type: self.resource.kind,
                id: self.resource.id,
                name: self.resource.name,
            },
            changes,
            metadata,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            success: self.success,
            error_msg: self.error_msg,
        })
    }
}
