//! Query model for audit history lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{ActorType, AuditAction, AuditEntry};

/// Filter and pagination parameters for [`AuditService::get_history`].
///
/// Every filter is optional; unset (or empty-string) fields match
/// everything. `actions` matches any of the listed actions. The time range
/// is inclusive on both ends. A `limit` of zero returns every match.
///
/// [`AuditService::get_history`]: crate::AuditService::get_history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditQuery {
    /// Match entries by this actor.
    pub actor_id: Option<String>,
    /// Match entries by this kind of actor.
    pub actor_type: Option<ActorType>,
    /// Match entries recorded in this session.
    pub session_id: Option<String>,
    /// Match entries with any of these actions.
    pub actions: Vec<AuditAction>,
    /// Match entries on this kind of resource.
    pub resource_type: Option<String>,
    /// Match entries on this resource.
    pub resource_id: Option<String>,
    /// Earliest timestamp (inclusive).
    pub start_time: Option<DateTime<Utc>>,
    /// Latest timestamp (inclusive).
    pub end_time: Option<DateTime<Utc>>,
    /// Match only successful or only failed entries.
    pub success: Option<bool>,
    /// Page size; zero means unbounded.
    pub limit: i64,
    /// Number of matches to skip.
    pub offset: i64,
}

impl AuditQuery {
    /// A query that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by actor.
    #[must_use]
    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Filter by actor type.
    #[must_use]
    pub fn with_actor_type(mut self, actor_type: ActorType) -> Self {
        self.actor_type = Some(actor_type);
        self
    }

    /// Filter by session.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Add an accepted action.
    #[must_use]
    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Replace the accepted actions.
    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = AuditAction>) -> Self {
        self.actions = actions.into_iter().collect();
        self
    }

    /// Filter by resource type.
    #[must_use]
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Filter by resource id.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Filter by resource type and id.
    #[must_use]
    pub fn with_resource(
        self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.with_resource_type(resource_type)
            .with_resource_id(resource_id)
    }

    /// Only entries at or after `start`.
    #[must_use]
    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Only entries at or before `end`.
    #[must_use]
    pub fn with_end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Only entries within `[start, end]`.
    #[must_use]
    pub fn with_time_range(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.with_start_time(start).with_end_time(end)
    }

    /// Only successful (`true`) or failed (`false`) entries.
    #[must_use]
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Page size.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Matches to skip.
    #[must_use]
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQueryResult {
    /// Matching entries, newest first.
    pub entries: Vec<AuditEntry>,
    /// Number of matches ignoring pagination.
    pub total: u64,
    /// Whether matches remain past this page.
    pub has_more: bool,
}

impl AuditQueryResult {
    /// Assemble a page, deriving `has_more` from the window position.
    ///
    /// With an unbounded `limit` (zero or less) there is never more.
    #[must_use]
    pub fn page(entries: Vec<AuditEntry>, total: u64, limit: i64, offset: i64) -> Self {
        let returned = u64::try_from(entries.len()).unwrap_or(u64::MAX);
        let offset = u64::try_from(offset).unwrap_or(0);
        let has_more = limit > 0 && offset.saturating_add(returned) < total;
        Self {
            entries,
            total,
            has_more,
        }
    }
}

/// `Some(s)` unless the value is absent or empty.
pub(crate) fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let start = Utc::now();
        let query = AuditQuery::new()
            .with_actor_id("u1")
            .with_actor_type(ActorType::User)
            .with_action(AuditAction::Login)
            .with_action(AuditAction::Logout)
            .with_resource("session", "s1")
            .with_time_range(start, start)
            .with_success(true)
            .with_limit(50)
            .with_offset(10);

        assert_eq!(query.actor_id.as_deref(), Some("u1"));
        assert_eq!(query.actions, vec![AuditAction::Login, AuditAction::Logout]);
        assert_eq!(query.resource_type.as_deref(), Some("session"));
        assert_eq!(query.resource_id.as_deref(), Some("s1"));
        assert_eq!(query.start_time, Some(start));
        assert_eq!(query.success, Some(true));
        assert_eq!((query.limit, query.offset), (50, 10));
    }

    #[test]
    fn test_unknown_action_in_json_query_rejected() {
        let err = serde_json::from_str::<AuditQuery>(r#"{"actions": ["login", "archive"]}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<AuditQuery>(r#"{"actor_type": "robot"}"#);
        assert!(err.is_err());
        let ok: AuditQuery = serde_json::from_str(r#"{"actor_type": "api", "limit": 5}"#).unwrap();
        assert_eq!(ok.actor_type, Some(ActorType::Api));
        assert_eq!(ok.limit, 5);
    }

    #[test]
    fn test_page_has_more() {
        let entries = vec![AuditEntry::default(); 2];
        assert!(AuditQueryResult::page(entries.clone(), 5, 2, 0).has_more);
        assert!(AuditQueryResult::page(entries.clone(), 5, 2, 2).has_more);
        assert!(!AuditQueryResult::page(entries.clone(), 4, 2, 2).has_more);
        assert!(!AuditQueryResult::page(entries, 5, 0, 0).has_more);
    }

    #[test]
    fn test_present_treats_empty_as_absent() {
        assert_eq!(present(None), None);
        assert_eq!(present(Some(&String::new())), None);
        assert_eq!(present(Some(&"x".to_owned())), Some("x"));
    }
}
