//! Audit entry types and actions.
//!
//! An [`AuditEntry`] records who ([`Actor`]) did what ([`AuditAction`]) to
//! which [`AuditResource`], when, and with what outcome. Entries are written
//! once and never updated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};

/// Unique identifier of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an entry ID from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidArgument`] if `s` is empty or not a UUID.
    pub fn parse(s: &str) -> AuditResult<Self> {
        if s.is_empty() {
            return Err(AuditError::InvalidArgument("id cannot be empty".to_owned()));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AuditError::InvalidArgument(format!("invalid id format: {s}")))
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuditEntryId {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// What was done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A resource was created.
    Create,
    /// A resource was modified.
    Update,
    /// A resource was removed.
    Delete,
    /// An actor signed in.
    Login,
    /// An actor signed out.
    Logout,
    /// A resource was read.
    View,
    /// Data left the system.
    Export,
}

impl AuditAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Login,
        Self::Logout,
        Self::View,
        Self::Export,
    ];

    /// The stored text form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::View => "view",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AuditError::InvalidArgument(
                "action cannot be empty".to_owned(),
            ));
        }
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AuditError::InvalidArgument(format!("invalid action: {s}")))
    }
}

/// The kind of principal that performed an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// An end user.
    User,
    /// The system itself (schedulers, migrations).
    System,
    /// Another service.
    Service,
    /// An API client.
    Api,
    /// An administrator.
    Admin,
}

impl ActorType {
    /// Every actor type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::User,
        Self::System,
        Self::Service,
        Self::Api,
        Self::Admin,
    ];

    /// The stored text form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::Service => "service",
            Self::Api => "api",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AuditError::InvalidArgument(
                "actor type cannot be empty".to_owned(),
            ));
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuditError::InvalidArgument(format!("invalid actor type: {s}")))
    }
}

/// Who performed the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identifier.
    pub id: String,
    /// Actor kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<ActorType>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Session the action happened in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Actor {
    /// An actor with an id and type and no name or session.
    #[must_use]
    pub fn new(id: impl Into<String>, actor_type: ActorType) -> Self {
        Self {
            id: id.into(),
            actor_type: Some(actor_type),
            name: None,
            session_id: None,
        }
    }
}

/// What the action was performed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResource {
    /// Resource kind (e.g. `"user"`, `"invoice"`).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AuditResource {
    /// A resource with a type and id and no name.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            name: None,
        }
    }
}

/// A single field modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name.
    pub field: String,
    /// Value before the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Value after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// A single audit log entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier; assigned on insert when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AuditEntryId>,
    /// When the action happened; defaults to insert time when absent.
    ///
    /// Stored with microsecond precision and a four-digit year; finer
    /// precision is truncated on insert, and years outside 0000 to 9999
    /// fail validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// The action being audited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AuditAction>,
    /// Who performed it.
    pub actor: Actor,
    /// What it was performed on.
    pub resource: AuditResource,
    /// Field-level modifications, in the order they were recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
    /// Free-form context.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    /// Client address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Whether the action succeeded.
    #[serde(default)]
    pub success: bool,
    /// Failure description; only set when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl AuditEntry {
    /// A successful entry with the required fields set and no id or
    /// timestamp.
    #[must_use]
    pub fn new(action: AuditAction, actor: Actor, resource: AuditResource) -> Self {
        Self {
            action: Some(action),
            actor,
            resource,
            success: true,
            ..Self::default()
        }
    }

    /// Return a copy with `id` and `timestamp` filled in where absent.
    #[must_use]
    pub fn with_defaults(&self, now: DateTime<Utc>) -> Self {
        let mut entry = self.clone();
        entry.id.get_or_insert_with(AuditEntryId::new);
        entry.timestamp.get_or_insert_with(|| stored_precision(now));
        entry
    }
}

/// `ts` truncated to the microsecond precision the store keeps.
#[must_use]
pub(crate) fn stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Whether `ts` has a year the store can order correctly (0000 to 9999).
#[must_use]
pub(crate) fn is_storable(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}
