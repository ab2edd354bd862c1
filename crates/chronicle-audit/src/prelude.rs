//! Prelude module - commonly used types for convenient import.
//!
//! Use `use chronicle_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Entry model
pub use crate::{
    Actor, ActorType, AuditAction, AuditEntry, AuditEntryId, AuditResource, FieldChange,
};

// Construction and querying
pub use crate::{AuditBuilder, AuditQuery, AuditQueryResult, Context};

// Service and storage
pub use crate::{AuditRepository, AuditService, Auditor, SurrealAuditRepository};
