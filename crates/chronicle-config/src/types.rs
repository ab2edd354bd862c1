//! Configuration types for Chronicle.
//!
//! Every struct implements [`Default`] with the production defaults, so a
//! bare `[store]` header in TOML yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store connection, retry and indexing settings.
    pub store: StoreConfig,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Settings for the audit document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string. The scheme selects the engine: `mem://`,
    /// `surrealkv://path`, `ws://host:port`, `wss://host:port`.
    pub uri: String,
    /// Namespace that holds the audit database.
    pub namespace: String,
    /// Database name.
    pub database: String,
    /// Collection (table) the entries are written to.
    pub collection: String,
    /// Upper bound on concurrently in-flight store operations.
    pub max_pool_size: u32,
    /// Lower bound of the pool; must not exceed `max_pool_size`.
    pub min_pool_size: u32,
    /// Maximum time to establish and verify the connection.
    pub connect_timeout_secs: u64,
    /// Retries after the first failed insert attempt.
    pub max_retries: u32,
    /// Fixed pause between insert attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Batch size reserved for bulk write paths.
    pub batch_size: usize,
    /// Provision the query indexes when the repository is created.
    pub enable_indexes: bool,
}

impl StoreConfig {
    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Delay between insert attempts as a [`Duration`].
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Default settings pointed at a different endpoint and database.
    #[must_use]
    pub fn with_endpoint(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// In-memory store settings, used by tests and local experiments.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_endpoint("mem://", "audit")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "ws://localhost:8000".to_owned(),
            namespace: "chronicle".to_owned(),
            database: "audit".to_owned(),
            collection: "audit_logs".to_owned(),
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 1000,
            batch_size: 1000,
            enable_indexes: true,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["chronicle_audit=debug",
    /// "surrealdb=warn"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
