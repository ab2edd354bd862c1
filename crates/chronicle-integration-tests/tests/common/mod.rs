//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chronicle_audit::{AuditRepository, Auditor, SurrealAuditRepository};
use chronicle_config::StoreConfig;
use chronicle_storage::{ConnectOptions, Database};
use chronicle_test::{MockRepository, setup_test_logging_default, test_store_config};

/// A service over a fresh in-memory store.
pub async fn memory_auditor() -> Auditor {
    setup_test_logging_default();
    Auditor::connect(&test_store_config()).await.unwrap()
}

/// A repository over a fresh in-memory store, keeping the database handle.
pub async fn memory_repository(config: &StoreConfig) -> (SurrealAuditRepository, Arc<Database>) {
    setup_test_logging_default();
    let options = ConnectOptions::new(&config.uri, &config.namespace, &config.database);
    let db = Arc::new(Database::connect(&options).await.unwrap());
    let repo = SurrealAuditRepository::with_database(Arc::clone(&db), config).unwrap();
    (repo, db)
}

/// A service over a mock repository, plus a handle on the mock.
pub fn mock_auditor() -> (Auditor, MockRepository) {
    let repo = MockRepository::new();
    let service = Auditor::new(Arc::new(repo.clone()) as Arc<dyn AuditRepository>);
    (service, repo)
}
