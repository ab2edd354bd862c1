//! `SurrealDB`-backed audit repository.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chronicle_config::StoreConfig;
use chronicle_storage::{ConnectOptions, Database, Params};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::AuditRepository;
use super::document::EntryDocument;
use super::filter::Filter;
use crate::context::Context;
use crate::entry::{ActorType, AuditEntry, AuditEntryId};
use crate::error::{AuditError, AuditResult};
use crate::query::{AuditQuery, AuditQueryResult};
use crate::retry::{RetryOutcome, RetryPolicy, retry};

/// Upper bound on index provisioning.
const INDEX_TIMEOUT: Duration = Duration::from_secs(30);

/// A secondary index on the audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    /// Name suffix; the full index name is `<table>_<suffix>`.
    pub suffix: &'static str,
    /// Indexed field paths, in order.
    pub fields: &'static [&'static str],
}

/// Indexes backing the supported query shapes. Each ends in `timestamp` so
/// the newest-first ordering can be served from the index.
pub const INDEXES: [IndexSpec; 7] = [
    IndexSpec {
        suffix: "actor_ts",
        fields: &["actor.id", "timestamp"],
    },
    IndexSpec {
        suffix: "actor_kind_ts",
        fields: &["actor.kind", "timestamp"],
    },
    IndexSpec {
        suffix: "session_ts",
        fields: &["actor.session_id", "timestamp"],
    },
    IndexSpec {
        suffix: "resource_ts",
        fields: &["resource.kind", "resource.id", "timestamp"],
    },
    IndexSpec {
        suffix: "action_ts",
        fields: &["action", "timestamp"],
    },
    IndexSpec {
        suffix: "ts",
        fields: &["timestamp"],
    },
    IndexSpec {
        suffix: "actor_id_kind_ts",
        fields: &["actor.id", "actor.kind", "timestamp"],
    },
];

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// Audit repository over a `SurrealDB` table.
///
/// Each entry is one record keyed by its entry id and written with
/// `CREATE`, so an existing record is never overwritten. Inserts retry with
/// a fixed delay; reads do not retry.
#[derive(Debug)]
pub struct SurrealAuditRepository {
    db: Arc<Database>,
    table: String,
    retry: RetryPolicy,
}

impl SurrealAuditRepository {
    /// Connect to the store described by `config`.
    ///
    /// Validates the configuration, connects and pings within the connect
    /// timeout, then provisions indexes when `enable_indexes` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Config`] for an invalid configuration, or
    /// [`AuditError::Storage`] if connecting or index provisioning fails.
    pub async fn connect(config: &StoreConfig) -> AuditResult<Self> {
        config.validate()?;

        let options = ConnectOptions::new(&config.uri, &config.namespace, &config.database)
            .with_connect_timeout(config.connect_timeout())
            .with_max_concurrency(usize::try_from(config.max_pool_size).unwrap_or(usize::MAX));
        let db = Database::connect(&options)
            .await
            .map_err(|e| AuditError::storage("connect to the audit store", e))?;

        let repo = Self::with_database(Arc::new(db), config)?;
        if config.enable_indexes {
            if let Err(e) = repo.ensure_indexes(&Context::background()).await {
                repo.db.close();
                return Err(e);
            }
        }

        info!(
            endpoint = %config.uri,
            collection = %config.collection,
            "audit repository ready"
        );
        Ok(repo)
    }

    /// Use an existing connection. Indexes are not provisioned.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Config`] for an invalid configuration.
    pub fn with_database(db: Arc<Database>, config: &StoreConfig) -> AuditResult<Self> {
        config.validate()?;
        Ok(Self {
            db,
            table: config.collection.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// The table entries are written to.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.table
    }

    /// The insert retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// The underlying connection.
    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn count(&self, ctx: &Context, filter: &Filter) -> AuditResult<u64> {
        const OP: &str = "count audit entries";
        let sql = format!(
            "SELECT count() AS total FROM {}{} GROUP ALL",
            self.table,
            filter.where_clause()
        );
        let rows: Vec<CountRow> = ctx
            .run(OP, self.db.fetch(&sql, filter.params().clone()))
            .await?
            .map_err(|e| AuditError::storage(OP, e))?;
        Ok(rows.first().map_or(0, |row| row.total))
    }

    async fn select(
        &self,
        ctx: &Context,
        operation: &'static str,
        filter: &Filter,
        limit: i64,
        offset: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        let mut sql = format!(
            "SELECT * OMIT id FROM {}{} ORDER BY timestamp DESC",
            self.table,
            filter.where_clause()
        );
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if offset > 0 {
            sql.push_str(&format!(" START {offset}"));
        }

        let docs: Vec<EntryDocument> = ctx
            .run(operation, self.db.fetch(&sql, filter.params().clone()))
            .await?
            .map_err(|e| AuditError::storage(operation, e))?;
        docs.into_iter().map(EntryDocument::into_entry).collect()
    }
}

fn record_params(table: &str, entry_id: String) -> Params {
    Params::from([
        ("tb".to_owned(), Value::from(table)),
        ("entry_id".to_owned(), Value::from(entry_id)),
    ])
}

#[async_trait]
impl AuditRepository for SurrealAuditRepository {
    async fn insert(&self, ctx: &Context, entry: &AuditEntry) -> AuditResult<()> {
        const OP: &str = "insert audit entry";
        let entry = entry.with_defaults(Utc::now());
        let doc = EntryDocument::from_entry(&entry)?;

        let mut params = record_params(&self.table, doc.entry_id.clone());
        params.insert("doc".to_owned(), serde_json::to_value(&doc)?);
        let sql = "CREATE type::thing($tb, $entry_id) CONTENT $doc RETURN NONE";

        let outcome = retry(ctx, &self.retry, OP, |_attempt| {
            self.db.execute(sql, params.clone())
        })
        .await?;

        match outcome {
            RetryOutcome::Success { attempts, .. } => {
                debug!(entry_id = %doc.entry_id, attempts, "audit entry stored");
                Ok(())
            },
            RetryOutcome::Exhausted { error, attempts } => {
                warn!(entry_id = %doc.entry_id, attempts, "audit entry not stored");
                Err(AuditError::InsertFailed {
                    attempts,
                    source: error,
                })
            },
        }
    }

    async fn find_by_query(
        &self,
        ctx: &Context,
        query: &AuditQuery,
    ) -> AuditResult<AuditQueryResult> {
        let filter = Filter::from_query(query);
        let total = self.count(ctx, &filter).await?;
        let entries = self
            .select(ctx, "find audit entries", &filter, query.limit, query.offset)
            .await?;
        Ok(AuditQueryResult::page(entries, total, query.limit, query.offset))
    }

    async fn find_by_id(&self, ctx: &Context, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        const OP: &str = "find audit entry";
        let docs: Vec<EntryDocument> = ctx
            .run(
                OP,
                self.db.fetch(
                    "SELECT * OMIT id FROM type::thing($tb, $entry_id)",
                    record_params(&self.table, id.to_string()),
                ),
            )
            .await?
            .map_err(|e| AuditError::storage(OP, e))?;
        docs.into_iter().next().map(EntryDocument::into_entry).transpose()
    }

    async fn find_by_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        resource_id: &str,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        let filter = Filter::for_resource(resource_type, resource_id);
        self.select(ctx, "find resource history", &filter, limit, 0)
            .await
    }

    async fn find_by_actor(
        &self,
        ctx: &Context,
        actor_id: &str,
        actor_type: Option<ActorType>,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>> {
        let filter = Filter::for_actor(actor_id, actor_type);
        self.select(ctx, "find actor history", &filter, limit, 0)
            .await
    }

    async fn ensure_indexes(&self, ctx: &Context) -> AuditResult<()> {
        const OP: &str = "create audit indexes";
        let ctx = ctx.child_with_timeout(INDEX_TIMEOUT);

        let mut statements = vec![format!(
            "DEFINE TABLE IF NOT EXISTS {} SCHEMALESS",
            self.table
        )];
        statements.extend(INDEXES.iter().map(|index| {
            format!(
                "DEFINE INDEX IF NOT EXISTS {table}_{suffix} ON TABLE {table} FIELDS {fields}",
                table = self.table,
                suffix = index.suffix,
                fields = index.fields.join(", ")
            )
        }));

        for sql in &statements {
            ctx.run(OP, self.db.execute(sql, Params::new()))
                .await?
                .map_err(|e| AuditError::storage(OP, e))?;
        }

        info!(table = %self.table, count = INDEXES.len(), "audit indexes ensured");
        Ok(())
    }

    async fn close(&self, _ctx: &Context) -> AuditResult<()> {
        self.db.close();
        Ok(())
    }
}
