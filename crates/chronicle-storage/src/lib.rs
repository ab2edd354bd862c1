//! Chronicle Storage - document store access.
//!
//! Wraps a **`SurrealDB`** connection behind the [`Database`] type. The
//! connection string picks the engine, so the same code runs against an
//! in-memory store in tests, an embedded `SurrealKV` directory on a single
//! host, or a remote `SurrealDB` server in production.
//!
//! | Deployment | Connection string |
//! |------------|-------------------|
//! | Tests | `mem://` |
//! | Single host | `surrealkv://path/to/data` |
//! | Production | `ws://host:8000`, `wss://host` |
//!
//! Statements are plain `SurrealQL`; values always travel as bound
//! [`Params`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod db;
pub mod error;

pub use db::{ConnectOptions, Database, Params, surrealdb, take_rows};
pub use error::{StorageError, StorageResult};
