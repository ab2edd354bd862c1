//! Loading a configuration file and running the audit trail it describes.

mod common;

use std::collections::HashMap;
use std::io::Write;

use chronicle_audit::{AuditQuery, AuditService, Auditor, Context, SurrealAuditRepository};
use chronicle_config::loader::load_with_env;
use chronicle_telemetry::{LogConfig, LogFormat};
use chronicle_test::{login_entry, setup_test_logging_default};

const CONFIG: &str = r#"
[store]
uri = "mem://"
namespace = "it"
database = "trail"
collection = "events"
retry_delay_ms = 5

[logging]
level = "debug"
format = "json"
directives = ["surrealdb=warn"]
"#;

#[tokio::test]
async fn test_file_and_env_drive_the_store() {
    setup_test_logging_default();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let env = HashMap::from([("CHRONICLE_STORE_MAX_RETRIES".to_owned(), "1".to_owned())]);

    let config = load_with_env(Some(file.path()), &env).unwrap();
    assert_eq!(config.store.collection, "events");
    assert_eq!(config.store.max_retries, 1);
    assert!(config.store.enable_indexes);

    let log = LogConfig::try_from(&config.logging).unwrap();
    assert_eq!(log.format, LogFormat::Json);
    assert_eq!(log.directives, ["surrealdb=warn"]);

    let repo = SurrealAuditRepository::connect(&config.store).await.unwrap();
    assert_eq!(repo.collection(), "events");
    assert_eq!(repo.retry_policy().max_attempts(), 2);

    let service = Auditor::connect(&config.store).await.unwrap();
    let ctx = Context::background();
    service.log_action(&ctx, login_entry("u7")).await.unwrap();
    let history = service
        .get_history(&ctx, &AuditQuery::new().with_session_id("u7-session"))
        .await
        .unwrap();
    assert_eq!(history.total, 1);
    service.close(&ctx).await.unwrap();
}

#[test]
fn test_invalid_collection_is_rejected_at_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[store]\ncollection = \"audit logs; DROP\"\n")
        .unwrap();
    assert!(load_with_env(Some(file.path()), &HashMap::new()).is_err());
}
