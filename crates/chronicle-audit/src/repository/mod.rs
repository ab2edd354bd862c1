//! Audit repository trait and the `SurrealDB`-backed implementation.

mod document;
mod filter;
mod surreal;

use async_trait::async_trait;

use crate::context::Context;
use crate::entry::{ActorType, AuditEntry, AuditEntryId};
use crate::error::AuditResult;
use crate::query::{AuditQuery, AuditQueryResult};

pub use document::{ActorDocument, ChangeDocument, EntryDocument, ResourceDocument};
pub use filter::Filter;
pub use surreal::{INDEXES, IndexSpec, SurrealAuditRepository};

/// Persistence backend for audit entries.
///
/// Implementations must be thread-safe. Entries are append-only: there is
/// no update or delete. Every find returns entries newest first, and a
/// `limit` of zero or less means unbounded.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persist an entry, filling in `id` and `timestamp` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted or `ctx` finishes
    /// first.
    async fn insert(&self, ctx: &Context, entry: &AuditEntry) -> AuditResult<()>;

    /// Find one page of entries matching `query`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `ctx` finishes first.
    async fn find_by_query(&self, ctx: &Context, query: &AuditQuery)
    -> AuditResult<AuditQueryResult>;

    /// Find an entry by id. A missing entry is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `ctx` finishes first.
    async fn find_by_id(&self, ctx: &Context, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>>;

    /// Find entries on one resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `ctx` finishes first.
    async fn find_by_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        resource_id: &str,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>>;

    /// Find entries by one actor, optionally narrowed to an actor type.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `ctx` finishes first.
    async fn find_by_actor(
        &self,
        ctx: &Context,
        actor_id: &str,
        actor_type: Option<ActorType>,
        limit: i64,
    ) -> AuditResult<Vec<AuditEntry>>;

    /// Create the query indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if provisioning fails or `ctx` finishes first.
    async fn ensure_indexes(&self, ctx: &Context) -> AuditResult<()>;

    /// Release the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend reports a failure while closing.
    async fn close(&self, ctx: &Context) -> AuditResult<()>;
}
