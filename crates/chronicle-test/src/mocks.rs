//! Mock implementations for testing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use chronicle_audit::retry::{RetryOutcome, RetryPolicy, retry};
use chronicle_audit::{
    ActorType, AuditEntry, AuditEntryId, AuditError, AuditQuery, AuditQueryResult,
    AuditRepository, AuditResult, Context,
};
use chronicle_storage::StorageError;

/// How many times each repository method was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `insert` calls.
    pub insert: u32,
    /// `find_by_query` calls.
    pub find_by_query: u32,
    /// `find_by_id` calls.
    pub find_by_id: u32,
    /// `find_by_resource` calls.
    pub find_by_resource: u32,
    /// `find_by_actor` calls.
    pub find_by_actor: u32,
    /// `ensure_indexes` calls.
    pub ensure_indexes: u32,
    /// `close` calls.
    pub close: u32,
}

impl CallCounts {
    /// Calls across every method.
    #[must_use]
    pub fn total(&self) -> u32 {
        [
            self.insert,
            self.find_by_query,
            self.find_by_id,
            self.find_by_resource,
            self.find_by_actor,
            self.ensure_indexes,
            self.close,
        ]
        .into_iter()
        .fold(0, u32::saturating_add)
    }
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<AuditEntry>,
    calls: CallCounts,
    failing_inserts: Option<u32>,
    closed: bool,
}

/// In-memory [`AuditRepository`] with call counters and insert failure
/// injection.
///
/// Clones share state, so a test can keep one handle while the service
/// owns another. Without a retry policy each insert is a single attempt
/// and a failure surfaces as [`AuditError::Storage`]; with one, inserts
/// retry like the `SurrealDB` repository and exhaustion surfaces as
/// [`AuditError::InsertFailed`].
#[derive(Debug, Clone, Default)]
pub struct MockRepository {
    state: Arc<Mutex<State>>,
    retry: Option<RetryPolicy>,
}

impl MockRepository {
    /// Create an empty mock repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load entries without counting an insert.
    #[must_use]
    pub fn with_entries(self, entries: impl IntoIterator<Item = AuditEntry>) -> Self {
        let now = Utc::now();
        self.lock()
            .entries
            .extend(entries.into_iter().map(|e| e.with_defaults(now)));
        self
    }

    /// Retry failed inserts under `policy`. Every attempt counts as an
    /// insert call.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Fail the next `n` insert attempts with a store error.
    pub fn fail_next_inserts(&self, n: u32) {
        self.lock().failing_inserts = Some(n);
    }

    /// Fail every insert attempt from now on.
    pub fn fail_all_inserts(&self) {
        self.lock().failing_inserts = Some(u32::MAX);
    }

    /// Call counts so far.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Every stored entry, in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().entries.clone()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn attempt_insert(&self, entry: &AuditEntry) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.calls.insert = state.calls.insert.saturating_add(1);
        if state.closed {
            return Err(StorageError::Closed);
        }
        if let Some(remaining) = state.failing_inserts {
            state.failing_inserts = remaining.checked_sub(1).filter(|n| *n > 0);
            return Err(StorageError::Query("injected failure".to_owned()));
        }
        if state.entries.iter().any(|e| e.id == entry.id) {
            return Err(StorageError::Query("duplicate entry id".to_owned()));
        }
        state.entries.push(entry.clone());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(
        &self,
        operation: &'static str,
        count: impl FnOnce(&mut CallCounts),
    ) -> AuditResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        count(&mut state.calls);
        if state.closed {
            return Err(AuditError::storage(operation, StorageError::Closed));
        }
        Ok(state)
    }

    fn select(
        &self,
        operation: &'static str,
        count: impl FnOnce(&mut CallCounts),
        query: &AuditQuery,
    ) -> AuditResult<(Vec<AuditEntry>, u64)> {
        let state = self.open(operation, count)?;
        let mut matched: Vec<AuditEntry> = state
            .entries
            .iter()
            .filter(|e| matches(query, e))
            .cloned()
            .collect();
        drop(state);

        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = u64::try_from(matched.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let page = matched.into_iter().skip(offset);
        let entries = match usize::try_from(query.limit) {
            Ok(limit) if limit > 0 => page.take(limit).collect(),
            _ => page.collect(),
        };
        Ok((entries, total))
    }
}

fn set(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Same criteria the store applies; unset and empty criteria match all.
fn matches(query: &AuditQuery, entry: &AuditEntry) -> bool {
    if let Some(actor_id) = set(query.actor_id.as_ref()) {
        if entry.actor.id != actor_id {
            return false;
        }
    }
    if query.actor_type.is_some() && entry.actor.actor_type != query.actor_type {
        return false;
    }
    if let Some(session_id) = set(query.session_id.as_ref()) {
        if entry.actor.session_id.as_deref() != Some(session_id) {
            return false;
        }
    }
    if !query.actions.is_empty() {
        match entry.action {
            Some(action) if query.actions.contains(&action) => {},
            _ => return false,
        }
    }
    if let Some(resource_type) = set(query.resource_type.as_ref()) {
        if entry.resource.resource_type != resource_type {
            return false;
        }
    }
    if let Some(resource_id) = set(query.resource_id.as_ref()) {
        if entry.resource.id != resource_id {
            return false;
        }
    }
    if let Some(success) = query.success {
        if entry.success != success {
            return false;
        }
    }
    if let Some(start) = query.start_time {
        if entry.timestamp.is_none_or(|ts| ts < start) {
            return false;
        }
    }
    if let Some(end) = query.end_time {
        if entry.timestamp.is_none_or(|ts| ts > end) {
            return false;
        }
    }
    true
}

#[async_trait]
impl AuditRepository for MockRepository {
    async fn insert(&self, ctx: &Context, entry: &AuditEntry) -> AuditResult<()> {
        const OP: &str = "insert audit entry";
        ctx.check(OP)?;
        let entry = entry.with_defaults(Utc::now());

        let Some(policy) = self.retry else {
            return self
                .attempt_insert(&entry)
                .map_err(|e| AuditError::storage(OP, e));
        };
        match retry(ctx, &policy, OP, |_attempt| {
            std::future::ready(self.attempt_insert(&entry))
        })
        .await?
        {
            RetryOutcome::Success { .. } => Ok(()),
            RetryOutcome::Exhausted { error, attempts } => Err(AuditError::InsertFailed {
                attempts,
                source: error,
            }),
        }
    }

    async fn find_by_query(
        &self,
        ctx: &Context,
        query: &AuditQuery,
    ) -> AuditResult<AuditQueryResult> {
        const OP: &str = "find audit entries";
        ctx.check(OP)?;
        let (entries, total) = self.select(
            OP,
            |c| c.find_by_query = c.find_by_query.saturating_add(1),
            query,
        )?;
        Ok(AuditQueryResult::page(entries, total, query.limit, query.offset))
    }

    async fn find_by_id(&self, ctx: &Context, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        const OP: &str = "find audit entry";
        ctx.check(OP)?;
        let state = self.open(OP, |c| c.find_by_id = c.find_by_id.saturating_add(1))?;
        Ok(state.entries.iter().find(|e| e.id == Some(*id)).cloned())
    }

    async fn find_by_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        resource_id: &str,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        const OP: &str = "find resource history";
        ctx.check(OP)?;
        let query = AuditQuery::new()
            .with_resource(resource_type, resource_id)
            .with_limit(limit);
        let (entries, _) = self.select(
            OP,
            |c| c.find_by_resource = c.find_by_resource.saturating_add(1),
            &query,
        )?;
        Ok(entries)
    }

    async fn find_by_actor(
        &self,
        ctx: &Context,
        actor_id: &str,
        actor_type: Option<ActorType>,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        const OP: &str = "find actor history";
        ctx.check(OP)?;
        let mut query = AuditQuery::new().with_actor_id(actor_id).with_limit(limit);
        query.actor_type = actor_type;
        let (entries, _) = self.select(
            OP,
            |c| c.find_by_actor = c.find_by_actor.saturating_add(1),
            &query,
        )?;
        Ok(entries)
    }

    async fn ensure_indexes(&self, ctx: &Context) -> AuditResult<()> {
        const OP: &str = "create audit indexes";
        ctx.check(OP)?;
        let _state = self.open(OP, |c| c.ensure_indexes = c.ensure_indexes.saturating_add(1))?;
        Ok(())
    }

    async fn close(&self, _ctx: &Context) -> AuditResult<()> {
        let mut state = self.lock();
        state.calls.close = state.calls.close.saturating_add(1);
        state.closed = true;
        Ok(())
    }
}
