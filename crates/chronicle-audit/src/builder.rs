//! Fluent construction of audit entries.
//!
//! ```rust,no_run
//! use chronicle_audit::{AuditBuilder, Context};
//!
//! # async fn example() -> chronicle_audit::AuditResult<()> {
//! AuditBuilder::new()
//!     .login()
//!     .user_with_session("user123", "John Doe", "session456")
//!     .resource("session", "session456", "User Session")
//!     .ip_address("192.168.1.1")
//!     .success(true)
//!     .log(&Context::background())
//!     .await
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::context::Context;
use crate::entry::{
    Actor, ActorType, AuditAction, AuditEntry, AuditEntryId, AuditResource, FieldChange,
    stored_precision,
};
use crate::error::{AuditError, AuditResult};
use crate::global;
use crate::service::AuditService;

fn non_empty(s: impl Into<String>) -> Option<String> {
    Some(s.into()).filter(|s| !s.is_empty())
}

fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

/// Builder for an [`AuditEntry`], optionally bound to a service that
/// [`log`](Self::log) sends it to.
///
/// Recording an error is final: once [`error`](Self::error) has been
/// called, [`success`](Self::success) can no longer mark the entry as
/// successful.
#[derive(Clone)]
#[must_use]
pub struct AuditBuilder {
    entry: AuditEntry,
    failed: bool,
    service: Option<Arc<dyn AuditService>>,
}

impl AuditBuilder {
    /// A builder with a fresh id and the current time, bound to the default
    /// service if one is installed.
    ///
    /// Timestamps are kept at the microsecond precision the store uses, so
    /// [`build`](Self::build) returns what a later read returns.
    pub fn new() -> Self {
        Self::bound_to(global::default_service())
    }

    /// A builder with a fresh id and the current time, bound to `service`.
    pub fn with_service(service: Arc<dyn AuditService>) -> Self {
        Self::bound_to(Some(service))
    }

    fn bound_to(service: Option<Arc<dyn AuditService>>) -> Self {
        Self {
            entry: AuditEntry {
                id: Some(AuditEntryId::new()),
                timestamp: Some(stored_precision(Utc::now())),
                ..AuditEntry::default()
            },
            failed: false,
            service,
        }
    }

    /// Replace the entry id.
    pub fn id(mut self, id: AuditEntryId) -> Self {
        self.entry.id = Some(id);
        self
    }

    /// Replace the timestamp, truncated to microseconds.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.entry.timestamp = Some(stored_precision(timestamp));
        self
    }

    /// Set the action.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.entry.action = Some(action);
        self
    }

    /// Replace the actor. An empty name is left unset, and any earlier
    /// session is cleared; use [`session`](Self::session) to add one.
    pub fn actor(
        mut self,
        id: impl Into<String>,
        actor_type: ActorType,
        name: impl Into<String>,
    ) -> Self {
        self.entry.actor = Actor {
            id: id.into(),
            actor_type: Some(actor_type),
            name: non_empty(name),
            session_id: None,
        };
        self
    }

    /// Set the actor together with a session.
    pub fn actor_with_session(
        self,
        id: impl Into<String>,
        actor_type: ActorType,
        name: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        self.actor(id, actor_type, name).session(session_id)
    }

    /// Set the session on the current actor.
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.entry.actor.session_id = non_empty(session_id);
        self
    }

    /// Set the resource. An empty name is left unset.
    pub fn resource(
        mut self,
        resource_type: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.entry.resource = AuditResource {
            resource_type: resource_type.into(),
            id: id.into(),
            name: non_empty(name),
        };
        self
    }

    /// Append a field change. JSON `null` on either side means absent.
    pub fn add_change(
        mut self,
        field: impl Into<String>,
        old_value: impl Into<Value>,
        new_value: impl Into<Value>,
    ) -> Self {
        self.entry.changes.push(FieldChange {
            field: field.into(),
            old_value: non_null(old_value.into()),
            new_value: non_null(new_value.into()),
        });
        self
    }

    /// Set a metadata key, replacing any previous value.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the client address.
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.entry.ip_address = non_empty(ip);
        self
    }

    /// Set the client user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.entry.user_agent = non_empty(user_agent);
        self
    }

    /// Set the outcome. Has no effect after [`error`](Self::error).
    pub fn success(mut self, success: bool) -> Self {
        self.entry.success = success && !self.failed;
        self
    }

    /// Record a failure: sets the error message and marks the entry failed.
    pub fn error(mut self, err: impl fmt::Display) -> Self {
        self.entry.error_msg = Some(err.to_string());
        self.entry.success = false;
        self.failed = true;
        self
    }

    /// [`error`](Self::error) if `err` is `Some`, otherwise unchanged.
    pub fn error_if<E: fmt::Display>(self, err: Option<E>) -> Self {
        match err {
            Some(err) => self.error(err),
            None => self,
        }
    }

    /// Success for `Ok`, [`error`](Self::error) for `Err`.
    pub fn outcome<T, E: fmt::Display>(self, result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => self.success(true),
            Err(err) => self.error(err),
        }
    }

    /// Acting user.
    pub fn user(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.actor(id, ActorType::User, name)
    }

    /// Acting user within a session.
    pub fn user_with_session(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        self.actor_with_session(id, ActorType::User, name, session_id)
    }

    /// Acting system component.
    pub fn system(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.actor(id, ActorType::System, name)
    }

    /// Acting service.
    pub fn service(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.actor(id, ActorType::Service, name)
    }

    /// Acting API client.
    pub fn api(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.actor(id, ActorType::Api, name)
    }

    /// Acting administrator.
    pub fn admin(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.actor(id, ActorType::Admin, name)
    }

    /// Acting administrator within a session.
    pub fn admin_with_session(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        self.actor_with_session(id, ActorType::Admin, name, session_id)
    }

    /// [`AuditAction::Create`].
    pub fn create(self) -> Self {
        self.action(AuditAction::Create)
    }

    /// [`AuditAction::Update`].
    pub fn update(self) -> Self {
        self.action(AuditAction::Update)
    }

    /// [`AuditAction::Delete`].
    pub fn delete(self) -> Self {
        self.action(AuditAction::Delete)
    }

    /// [`AuditAction::Login`].
    pub fn login(self) -> Self {
        self.action(AuditAction::Login)
    }

    /// [`AuditAction::Logout`].
    pub fn logout(self) -> Self {
        self.action(AuditAction::Logout)
    }

    /// [`AuditAction::View`].
    pub fn view(self) -> Self {
        self.action(AuditAction::View)
    }

    /// [`AuditAction::Export`].
    pub fn export(self) -> Self {
        self.action(AuditAction::Export)
    }

    /// The entry built so far.
    #[must_use]
    pub fn build(&self) -> AuditEntry {
        self.entry.clone()
    }

    /// Whether a service is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.service.is_some()
    }

    /// Send the entry to the bound service.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::NotConfigured`] if no service is bound, or the
    /// service's error.
    pub async fn log(&self, ctx: &Context) -> AuditResult<()> {
        let service = self.service.as_ref().ok_or(AuditError::NotConfigured)?;
        service.log_action(ctx, self.build()).await
    }
}

impl Default for AuditBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuditBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditBuilder")
            .field("entry", &self.entry)
            .field("failed", &self.failed)
            .field("bound", &self.is_bound())
            .finish()
    }
}
