//! Translation of query criteria into a `SurrealQL` `WHERE` clause.
//!
//! Field paths and parameter names are fixed; values are only ever bound as
//! parameters.

use chronicle_storage::Params;
use serde_json::Value;

use super::document::format_timestamp;
use crate::entry::ActorType;
use crate::query::{AuditQuery, present};

/// A conjunction of conditions plus the values they bind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<String>,
    params: Params,
}

impl Filter {
    /// A filter that matches every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conditions for every criterion set on `query`; unset and empty
    /// criteria are left out. Pagination is not part of the filter.
    #[must_use]
    pub fn from_query(query: &AuditQuery) -> Self {
        let mut filter = Self::new();

        if let Some(actor_id) = present(query.actor_id.as_ref()) {
            filter.push("actor.id = $actor_id", "actor_id", actor_id);
        }
        if let Some(actor_type) = query.actor_type {
            filter.push("actor.kind = $actor_kind", "actor_kind", actor_type.as_str());
        }
        if let Some(session_id) = present(query.session_id.as_ref()) {
            filter.push("actor.session_id = $session_id", "session_id", session_id);
        }
        if !query.actions.is_empty() {
            let actions: Vec<Value> = query
                .actions
                .iter()
                .map(|a| Value::from(a.as_str()))
                .collect();
            filter.push("action IN $actions", "actions", actions);
        }
        if let Some(resource_type) = present(query.resource_type.as_ref()) {
            filter.push("resource.kind = $resource_kind", "resource_kind", resource_type);
        }
        if let Some(resource_id) = present(query.resource_id.as_ref()) {
            filter.push("resource.id = $resource_id", "resource_id", resource_id);
        }
        if let Some(success) = query.success {
            filter.push("success = $success", "success", success);
        }
        if let Some(start) = &query.start_time {
            filter.push("timestamp >= $start_time", "start_time", format_timestamp(start));
        }
        if let Some(end) = &query.end_time {
            filter.push("timestamp <= $end_time", "end_time", format_timestamp(end));
        }

        filter
    }

    /// Entries on one resource.
    #[must_use]
    pub fn for_resource(resource_type: &str, resource_id: &str) -> Self {
        Self::from_query(&AuditQuery::new().with_resource(resource_type, resource_id))
    }

    /// Entries by one actor, optionally of one type.
    #[must_use]
    pub fn for_actor(actor_id: &str, actor_type: Option<ActorType>) -> Self {
        let mut query = AuditQuery::new().with_actor_id(actor_id);
        query.actor_type = actor_type;
        Self::from_query(&query)
    }

    fn push(&mut self, clause: &str, param: &str, value: impl Into<Value>) {
        self.clauses.push(clause.to_owned());
        self.params.insert(param.to_owned(), value.into());
    }

    /// Whether the filter matches every row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The individual conditions, in a stable order.
    #[must_use]
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// The bound values, keyed by parameter name.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// `" WHERE a AND b"`, or an empty string when there are no conditions.
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}
