//! `SurrealDB` document store interface.
//!
//! The [`Database`] struct wraps a `SurrealDB` connection on the `any`
//! engine, so the connection string alone picks the backend.
//!
//! # Connection Strings
//!
//! | Mode | Connection | Backend |
//! |------|-----------|---------|
//! | Embedded (test) | `mem://` | In-memory |
//! | Embedded (dev) | `surrealkv://path/to/data` | `SurrealKV` |
//! | Remote | `ws://host:8000`, `wss://host` | `SurrealDB` server |
//!
//! # Usage
//!
//! ```rust,ignore
//! use chronicle_storage::{ConnectOptions, Database};
//!
//! let db = Database::connect(&ConnectOptions::new("ws://localhost:8000", "chronicle", "audit")).await?;
//! // or
//! let db = Database::connect_memory().await?;
//! ```

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Re-export `SurrealDB` for direct access when needed.
pub use surrealdb;

/// Named parameters bound to a statement (`$name` in `SurrealQL`).
pub type Params = BTreeMap<String, serde_json::Value>;

/// How to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Connection string; the scheme selects the engine.
    pub endpoint: String,
    /// Namespace to select after connecting.
    pub namespace: String,
    /// Database to select after connecting.
    pub database: String,
    /// Budget for connecting, selecting and the initial ping.
    pub connect_timeout: Duration,
    /// Maximum number of store operations in flight at once.
    pub max_concurrency: usize,
}

impl ConnectOptions {
    /// Options with a 10 second connect timeout and 100 concurrent
    /// operations.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: namespace.into(),
            database: database.into(),
            connect_timeout: Duration::from_secs(10),
            max_concurrency: 100,
        }
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the concurrent operation bound. Zero is treated as one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }
}

/// `SurrealDB` connection wrapper.
///
/// Cheap to share behind an `Arc`; every operation takes `&self`. The
/// number of concurrently executing statements is bounded by
/// [`ConnectOptions::max_concurrency`]. After [`close`](Self::close) every
/// operation fails with [`StorageError::Closed`].
pub struct Database {
    inner: RwLock<Option<Surreal<Any>>>,
    permits: Semaphore,
    endpoint: String,
}

impl Database {
    /// Connect, select the namespace and database, and ping the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if any step fails, or
    /// [`StorageError::Timeout`] if they do not finish within
    /// [`ConnectOptions::connect_timeout`].
    pub async fn connect(options: &ConnectOptions) -> StorageResult<Self> {
        let attempt = async {
            let db = surrealdb::engine::any::connect(options.endpoint.clone())
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            db.use_ns(options.namespace.clone())
                .use_db(options.database.clone())
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            db.health()
                .await
                .map_err(|e| StorageError::Connection(format!("ping failed: {e}")))?;
            Ok::<_, StorageError>(db)
        };

        let db = tokio::time::timeout(options.connect_timeout, attempt)
            .await
            .map_err(|_| StorageError::Timeout {
                operation: format!("connect to {}", options.endpoint),
                after_ms: options.connect_timeout.as_millis(),
            })??;

        let permits = options.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        info!(
            endpoint = %options.endpoint,
            namespace = %options.namespace,
            database = %options.database,
            max_concurrency = permits,
            "connected to document store"
        );

        Ok(Self {
            inner: RwLock::new(Some(db)),
            permits: Semaphore::new(permits),
            endpoint: options.endpoint.clone(),
        })
    }

    /// Connect to an in-memory `SurrealDB` (for tests).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the connection fails.
    pub async fn connect_memory() -> StorageResult<Self> {
        Self::connect(&ConnectOptions::new("mem://", "chronicle", "test")).await
    }

    /// The connection string this handle was opened with.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ping the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after [`close`](Self::close), or
    /// [`StorageError::Connection`] if the backend does not answer.
    pub async fn health(&self) -> StorageResult<()> {
        let _permit = self.acquire().await?;
        let client = self.handle()?;
        client
            .health()
            .await
            .map_err(|e| StorageError::Connection(format!("ping failed: {e}")))
    }

    /// Run a statement and return the raw response.
    ///
    /// Values are always passed through `params`, never spliced into `sql`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after [`close`](Self::close), or
    /// [`StorageError::Query`] if the request fails.
    pub async fn query(&self, sql: &str, params: Params) -> StorageResult<surrealdb::Response> {
        let _permit = self.acquire().await?;
        let client = self.handle()?;
        debug!(sql, params = params.len(), "executing statement");
        let response = client.query(sql.to_owned()).bind(params).await?;
        Ok(response)
    }

    /// Run a statement and fail if any of its results is an error.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub async fn execute(&self, sql: &str, params: Params) -> StorageResult<()> {
        self.query(sql, params).await?.check()?;
        Ok(())
    }

    /// Run a statement and deserialize the rows of its first result.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query); row decoding failures are reported as
    /// [`StorageError::Serialization`].
    pub async fn fetch<T: DeserializeOwned>(&self, sql: &str, params: Params) -> StorageResult<Vec<T>> {
        let mut response = self.query(sql, params).await?;
        take_rows(&mut response, 0)
    }

    /// Release the connection. Idempotent.
    pub fn close(&self) {
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.permits.close();
        if previous.is_some() {
            info!(endpoint = %self.endpoint, "document store connection closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    async fn acquire(&self) -> StorageResult<tokio::sync::SemaphorePermit<'_>> {
        self.permits.acquire().await.map_err(|_| StorageError::Closed)
    }

    fn handle(&self) -> StorageResult<Surreal<Any>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StorageError::Closed)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("endpoint", &self.endpoint)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Deserialize the rows of statement `index` in `response`.
///
/// # Errors
///
/// Returns [`StorageError::Query`] if that statement failed, or
/// [`StorageError::Serialization`] if its rows do not match `T`.
pub fn take_rows<T: DeserializeOwned>(
    response: &mut surrealdb::Response,
    index: usize,
) -> StorageResult<Vec<T>> {
    response.take::<Vec<T>>(index).map_err(|e| match e {
        surrealdb::Error::Db(db_err) => StorageError::Query(db_err.to_string()),
        other => StorageError::Serialization(other.to_string()),
    })
}
