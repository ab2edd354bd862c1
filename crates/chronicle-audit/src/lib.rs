//! Chronicle Audit - an append-only audit trail over a document store.
//!
//! This crate provides:
//! - The [`AuditEntry`] record: who did what to which resource, when, and
//!   with what outcome
//! - [`AuditBuilder`] for assembling entries fluently
//! - [`AuditService`] / [`Auditor`], which validate before touching the
//!   store
//! - [`AuditRepository`] with a `SurrealDB` implementation that retries
//!   failed inserts with a fixed delay
//! - [`AuditQuery`] filtering with offset/limit pagination, newest first
//! - A [`Context`] carrying cancellation and a deadline through every call
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chronicle_audit::prelude::*;
//! use chronicle_config::StoreConfig;
//!
//! # async fn example() -> AuditResult<()> {
//! let service = Arc::new(Auditor::connect(&StoreConfig::in_memory()).await?);
//! let ctx = Context::background();
//!
//! AuditBuilder::with_service(service.clone())
//!     .update()
//!     .user_with_session("user123", "John Doe", "session456")
//!     .resource("user", "user456", "Jane Smith Profile")
//!     .add_change("email", "old@example.com", "new@example.com")
//!     .metadata("source", "admin_panel")
//!     .success(true)
//!     .log(&ctx)
//!     .await?;
//!
//! let page = service
//!     .get_history(&ctx, &AuditQuery::new().with_actor_id("user123").with_limit(50))
//!     .await?;
//! assert_eq!(page.total, 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod global;
pub mod prelude;
pub mod repository;
pub mod retry;

mod builder;
mod context;
mod entry;
mod error;
mod query;
mod service;

pub use builder::AuditBuilder;
pub use context::Context;
pub use entry::{
    Actor, ActorType, AuditAction, AuditEntry, AuditEntryId, AuditResource, FieldChange,
};
pub use error::{AuditError, AuditResult};
pub use query::{AuditQuery, AuditQueryResult};
pub use repository::{AuditRepository, SurrealAuditRepository};
pub use service::{AuditService, Auditor, validate_entry, validate_query};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
