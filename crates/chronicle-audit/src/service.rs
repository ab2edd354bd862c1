//! The audit service: validation in front of a repository.

use std::sync::Arc;

use async_trait::async_trait;
use chronicle_config::StoreConfig;

use crate::context::Context;
use crate::entry::{ActorType, AuditEntry, AuditEntryId, is_storable};
use crate::error::{AuditError, AuditResult};
use crate::query::{AuditQuery, AuditQueryResult};
use crate::repository::{AuditRepository, SurrealAuditRepository};

/// Entry point for recording and reading the audit trail.
///
/// Every method validates its input before touching the store; validation
/// failures are never retried.
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Validate and persist an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidEntry`] for an incomplete entry, or the
    /// repository's error if persisting fails.
    async fn log_action(&self, ctx: &Context, entry: AuditEntry) -> AuditResult<()>;

    /// Find entries matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidQuery`] for a malformed query, or the
    /// repository's error.
    async fn get_history(&self, ctx: &Context, query: &AuditQuery)
    -> AuditResult<AuditQueryResult>;

    /// Look up one entry by its id text. A missing entry is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidArgument`] for an empty or malformed
    /// id, or the repository's error.
    async fn get_by_id(&self, ctx: &Context, id: &str) -> AuditResult<Option<AuditEntry>>;

    /// Entries on one resource, newest first; `limit` 0 is unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidArgument`] for an empty identifier or a
    /// negative limit, or the repository's error.
    async fn get_resource_history(
        &self,
        ctx: &Context,
        resource_type: &str,
        resource_id: &str,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>>;

    /// Entries by one actor, newest first; `limit` 0 is unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidArgument`] for an empty actor id or a
    /// negative limit, or the repository's error.
    async fn get_actor_history(
        &self,
        ctx: &Context,
        actor_id: &str,
        actor_type: Option<ActorType>,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>>;

    /// Create the store indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns the repository's error.
    async fn ensure_indexes(&self, ctx: &Context) -> AuditResult<()>;

    /// Release the store.
    ///
    /// # Errors
    ///
    /// Returns the repository's error.
    async fn close(&self, ctx: &Context) -> AuditResult<()>;
}

/// The standard [`AuditService`]: validates, then delegates to a repository.
#[derive(Clone)]
pub struct Auditor {
    repo: Arc<dyn AuditRepository>,
}

impl Auditor {
    /// Wrap a repository.
    #[must_use]
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Connect a `SurrealDB` repository and wrap it.
    ///
    /// # Errors
    ///
    /// See [`SurrealAuditRepository::connect`].
    pub async fn connect(config: &StoreConfig) -> AuditResult<Self> {
        let repo = SurrealAuditRepository::connect(config).await?;
        Ok(Self::new(Arc::new(repo)))
    }

    /// The wrapped repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn AuditRepository> {
        &self.repo
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor").finish_non_exhaustive()
    }
}

/// Check that an entry has every required field and a storable timestamp.
///
/// # Errors
///
/// Returns [`AuditError::InvalidEntry`] naming the first missing field, or
/// for a timestamp year outside 0000 to 9999.
pub fn validate_entry(entry: &AuditEntry) -> AuditResult<()> {
    let problem = if entry.action.is_none() {
        "action cannot be empty"
    } else if entry.actor.id.is_empty() {
        "actor ID cannot be empty"
    } else if entry.actor.actor_type.is_none() {
        "actor type cannot be empty"
    } else if entry.resource.resource_type.is_empty() {
        "resource type cannot be empty"
    } else if entry.resource.id.is_empty() {
        "resource ID cannot be empty"
    } else if entry.timestamp.is_some_and(|ts| !is_storable(&ts)) {
        YEAR_RANGE
    } else {
        return Ok(());
    };
    Err(AuditError::InvalidEntry(problem.to_owned()))
}

const YEAR_RANGE: &str = "timestamp year must be between 0000 and 9999";

/// Check pagination and time range.
///
/// # Errors
///
/// Returns [`AuditError::InvalidQuery`] describing the first problem.
pub fn validate_query(query: &AuditQuery) -> AuditResult<()> {
    if query.limit < 0 {
        return Err(AuditError::InvalidQuery("limit cannot be negative".to_owned()));
    }
    if query.offset < 0 {
        return Err(AuditError::InvalidQuery("offset cannot be negative".to_owned()));
    }
    if [query.start_time, query.end_time]
        .iter()
        .flatten()
        .any(|ts| !is_storable(ts))
    {
        return Err(AuditError::InvalidQuery(YEAR_RANGE.to_owned()));
    }
    if let (Some(start), Some(end)) = (query.start_time, query.end_time) {
        if start > end {
            return Err(AuditError::InvalidQuery(
                "start time cannot be after end time".to_owned(),
            ));
        }
    }
    Ok(())
}

fn require(value: &str, message: &str) -> AuditResult<()> {
    if value.is_empty() {
        return Err(AuditError::InvalidArgument(message.to_owned()));
    }
    Ok(())
}

fn require_limit(limit: i64) -> AuditResult<()> {
    if limit < 0 {
        return Err(AuditError::InvalidArgument(
            "limit cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

#[async_trait]
impl AuditService for Auditor {
    async fn log_action(&self, ctx: &Context, entry: AuditEntry) -> AuditResult<()> {
        validate_entry(&entry)?;
        self.repo.insert(ctx, &entry).await
    }

    async fn get_history(
        &self,
        ctx: &Context,
        query: &AuditQuery,
    ) -> AuditResult<AuditQueryResult> {
        validate_query(query)?;
        self.repo.find_by_query(ctx, query).await
    }

    async fn get_by_id(&self, ctx: &Context, id: &str) -> AuditResult<Option<AuditEntry>> {
        let id = AuditEntryId::parse(id)?;
        self.repo.find_by_id(ctx, &id).await
    }

    async fn get_resource_history(
        &self,
        ctx: &Context,
        resource_type: &str,
        resource_id: &str,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        require(resource_type, "resource type cannot be empty")?;
        require(resource_id, "resource ID cannot be empty")?;
        require_limit(limit)?;
        self.repo
            .find_by_resource(ctx, resource_type, resource_id, limit)
            .await
    }

    async fn get_actor_history(
        &self,
        ctx: &Context,
        actor_id: &str,
        actor_type: Option<ActorType>,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        require(actor_id, "actor ID cannot be empty")?;
        require_limit(limit)?;
        self.repo
            .find_by_actor(ctx, actor_id, actor_type, limit)
            .await
    }

    async fn ensure_indexes(&self, ctx: &Context) -> AuditResult<()> {
        self.repo.ensure_indexes(ctx).await
    }

    async fn close(&self, ctx: &Context) -> AuditResult<()> {
        self.repo.close(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::entry::{Actor, AuditAction, AuditResource};

    /// Records every call; returns empty results.
    #[derive(Default)]
    struct RecordingRepo {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingRepo {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }
    }

    #[async_trait]
    impl AuditRepository for RecordingRepo {
        async fn insert(&self, _ctx: &Context, _entry: &AuditEntry) -> AuditResult<()> {
            self.record("insert");
            Ok(())
        }

        async fn find_by_query(
            &self,
            _ctx: &Context,
            _query: &AuditQuery,
        ) -> AuditResult<AuditQueryResult> {
            self.record("find_by_query");
            Ok(AuditQueryResult::default())
        }

        async fn find_by_id(
            &self,
            _ctx: &Context,
            _id: &AuditEntryId,
        ) -> AuditResult<Option<AuditEntry>> {
            self.record("find_by_id");
            Ok(None)
        }

        async fn find_by_resource(
            &self,
            _ctx: &Context,
            _resource_type: &str,
            _resource_id: &str,
            _limit: i64,
        ) -> AuditResult<Vec<AuditEntry>> {
            self.record("find_by_resource");
            Ok(Vec::new())
        }

        async fn find_by_actor(
            &self,
            _ctx: &Context,
            _actor_id: &str,
            _actor_type: Option<ActorType>,
            _limit: i64,
        ) -> AuditResult<Vec<AuditEntry>> {
            self.record("find_by_actor");
            Ok(Vec::new())
        }

        async fn ensure_indexes(&self, _ctx: &Context) -> AuditResult<()> {
            self.record("ensure_indexes");
            Ok(())
        }

        async fn close(&self, _ctx: &Context) -> AuditResult<()> {
            self.record("close");
            Ok(())
        }
    }

    fn auditor() -> (Auditor, Arc<RecordingRepo>) {
        let repo = Arc::new(RecordingRepo::default());
        (Auditor::new(Arc::clone(&repo) as Arc<dyn AuditRepository>), repo)
    }

    fn valid_entry() -> AuditEntry {
        AuditEntry::new(
            AuditAction::Create,
            Actor::new("u1", ActorType::User),
            AuditResource::new("document", "d1"),
        )
    }

    #[tokio::test]
    async fn test_valid_entry_reaches_repository() {
        let (service, repo) = auditor();
        service
            .log_action(&Context::background(), valid_entry())
            .await
            .unwrap();
        assert_eq!(repo.calls(), ["insert"]);
    }

    #[tokio::test]
    async fn test_each_missing_field_rejected_independently() {
        let cases: [(fn(&mut AuditEntry), &str); 5] = [
            (|e| e.action = None, "action cannot be empty"),
            (|e| e.actor.id.clear(), "actor ID cannot be empty"),
            (|e| e.actor.actor_type = None, "actor type cannot be empty"),
            (
                |e| e.resource.resource_type.clear(),
                "resource type cannot be empty",
            ),
            (|e| e.resource.id.clear(), "resource ID cannot be empty"),
        ];

        let (service, repo) = auditor();
        for (break_entry, message) in cases {
            let mut entry = valid_entry();
            break_entry(&mut entry);
            let err = service
                .log_action(&Context::background(), entry)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), format!("invalid audit entry: {message}"));
        }
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_years_rejected() {
        let (service, repo) = auditor();
        let ctx = Context::background();
        let far = chrono::TimeZone::with_ymd_and_hms(&Utc, 10_000, 1, 1, 0, 0, 0).unwrap();

        let mut entry = valid_entry();
        entry.timestamp = Some(far);
        let err = service.log_action(&ctx, entry).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid audit entry: timestamp year must be between 0000 and 9999"
        );

        let err = service
            .get_history(&ctx, &AuditQuery::new().with_end_time(far))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid query: timestamp year must be between 0000 and 9999"
        );
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_validation() {
        let (service, repo) = auditor();
        let ctx = Context::background();
        let now = Utc::now();
        let earlier = now.checked_sub_signed(chrono::Duration::minutes(5)).unwrap();

        let cases = [
            (AuditQuery::new().with_limit(-1), "limit cannot be negative"),
            (AuditQuery::new().with_offset(-1), "offset cannot be negative"),
            (
                AuditQuery::new().with_time_range(now, earlier),
                "start time cannot be after end time",
            ),
        ];
        for (query, message) in cases {
            let err = service.get_history(&ctx, &query).await.unwrap_err();
            assert_eq!(err.to_string(), format!("invalid query: {message}"));
        }
        assert!(repo.calls().is_empty());

        // Equal bounds are an inclusive single instant.
        service
            .get_history(&ctx, &AuditQuery::new().with_time_range(now, now))
            .await
            .unwrap();
        assert_eq!(repo.calls(), ["find_by_query"]);
    }

    #[tokio::test]
    async fn test_get_by_id_validates_format() {
        let (service, repo) = auditor();
        let ctx = Context::background();

        let err = service.get_by_id(&ctx, "").await.unwrap_err();
        assert_eq!(err.to_string(), "id cannot be empty");
        let err = service.get_by_id(&ctx, "42").await.unwrap_err();
        assert!(err.is_validation());
        assert!(repo.calls().is_empty());

        let found = service
            .get_by_id(&ctx, &AuditEntryId::new().to_string())
            .await
            .unwrap();
        assert!(found.is_none());
        assert_eq!(repo.calls(), ["find_by_id"]);
    }

    #[tokio::test]
    async fn test_history_argument_validation() {
        let (service, repo) = auditor();
        let ctx = Context::background();

        let err = service
            .get_resource_history(&ctx, "", "d1", 0)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "resource type cannot be empty");
        let err = service
            .get_resource_history(&ctx, "document", "", 0)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "resource ID cannot be empty");
        let err = service
            .get_resource_history(&ctx, "document", "d1", -5)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "limit cannot be negative");
        let err = service
            .get_actor_history(&ctx, "", None, 0)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "actor ID cannot be empty");
        assert!(repo.calls().is_empty());

        service
            .get_actor_history(&ctx, "u1", Some(ActorType::Admin), 10)
            .await
            .unwrap();
        service
            .get_resource_history(&ctx, "document", "d1", 0)
            .await
            .unwrap();
        assert_eq!(repo.calls(), ["find_by_actor", "find_by_resource"]);
    }

    #[tokio::test]
    async fn test_lifecycle_delegates() {
        let (service, repo) = auditor();
        let ctx = Context::background();
        service.ensure_indexes(&ctx).await.unwrap();
        service.close(&ctx).await.unwrap();
        assert_eq!(repo.calls(), ["ensure_indexes", "close"]);
    }
}
