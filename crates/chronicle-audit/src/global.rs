//! Process-wide default audit service.
//!
//! Constructor injection ([`Auditor::new`], [`AuditBuilder::with_service`])
//! is the primary way to wire the audit trail. This module adds an optional
//! default instance for call sites that cannot carry a handle; it is
//! expected to be installed once at startup and cleared at shutdown.
//!
//! [`AuditBuilder::with_service`]: crate::AuditBuilder::with_service

use std::sync::{Arc, PoisonError, RwLock};

use chronicle_config::StoreConfig;
use tracing::info;

use crate::context::Context;
use crate::entry::{ActorType, AuditEntry};
use crate::error::{AuditError, AuditResult};
use crate::query::{AuditQuery, AuditQueryResult};
use crate::service::{AuditService, Auditor};

static DEFAULT: RwLock<Option<Arc<dyn AuditService>>> = RwLock::new(None);

/// Install `service` as the default, returning the one it replaces.
pub fn set_default_service(service: Arc<dyn AuditService>) -> Option<Arc<dyn AuditService>> {
    DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(service)
}

/// Remove the default service, returning it.
pub fn clear_default_service() -> Option<Arc<dyn AuditService>> {
    DEFAULT.write().unwrap_or_else(PoisonError::into_inner).take()
}

/// The current default service, if any.
#[must_use]
pub fn default_service() -> Option<Arc<dyn AuditService>> {
    DEFAULT.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn require_default() -> AuditResult<Arc<dyn AuditService>> {
    default_service().ok_or(AuditError::NotConfigured)
}

/// Connect an [`Auditor`] for `config` and install it as the default.
///
/// # Errors
///
/// Returns the connection error; the previous default is left in place.
pub async fn initialize(config: &StoreConfig) -> AuditResult<()> {
    let auditor = Auditor::connect(config).await?;
    set_default_service(Arc::new(auditor));
    info!(collection = %config.collection, "default audit service installed");
    Ok(())
}

/// [`initialize`] with default settings for the given endpoint and database.
///
/// # Errors
///
/// See [`initialize`].
pub async fn initialize_with_defaults(uri: &str, database: &str) -> AuditResult<()> {
    initialize(&StoreConfig::with_endpoint(uri, database)).await
}

/// [`AuditService::log_action`] on the default service.
///
/// # Errors
///
/// Returns [`AuditError::NotConfigured`] without a default service.
pub async fn log_action(ctx: &Context, entry: AuditEntry) -> AuditResult<()> {
    require_default()?.log_action(ctx, entry).await
}

/// [`AuditService::get_history`] on the default service.
///
/// # Errors
///
/// Returns [`AuditError::NotConfigured`] without a default service.
pub async fn get_history(ctx: &Context, query: &AuditQuery) -> AuditResult<AuditQueryResult> {
    require_default()?.get_history(ctx, query).await
}

/// [`AuditService::get_by_id`] on the default service.
///
/// # Errors
///
/// Returns [`AuditError::NotConfigured`] without a default service.
pub async fn get_by_id(ctx: &Context, id: &str) -> AuditResult<Option<AuditEntry>> {
    require_default()?.get_by_id(ctx, id).await
}

/// [`AuditService::get_resource_history`] on the default service.
///
/// # Errors
///
/// Returns [`AuditError::NotConfigured`] without a default service.
pub async fn get_resource_history(
    ctx: &Context,
    resource_type: &str,
    resource_id: &str,
    limit: i64,
) -> AuditResult<Vec<AuditEntry>> {
    require_default()?
        .get_resource_history(ctx, resource_type, resource_id, limit)
        .await
}

/// [`AuditService::get_actor_history`] on the default service.
///
/// # Errors
///
/// Returns [`AuditError::NotConfigured`] without a default service.
pub async fn get_actor_history(
    ctx: &Context,
    actor_id: &str,
    actor_type: Option<ActorType>,
    limit: i64,
) -> AuditResult<Vec<AuditEntry>> {
    require_default()?
        .get_actor_history(ctx, actor_id, actor_type, limit)
        .await
}

/// Close and remove the default service. A no-op when none is installed.
///
/// # Errors
///
/// Returns the service's close error; the service is removed regardless.
pub async fn shutdown(ctx: &Context) -> AuditResult<()> {
    match clear_default_service() {
        Some(service) => service.close(ctx).await,
        None => Ok(()),
    }
}
