//! Chronicle Test - shared test utilities.
//!
//! Fixtures for entries and store settings, an in-memory
//! [`MockRepository`] with call counters and insert failure injection, and
//! a logging helper for tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use chronicle_audit::{AuditService, Auditor, Context};
//! use chronicle_test::{MockRepository, login_entry};
//!
//! #[tokio::test]
//! async fn test_login_is_recorded() {
//!     let repo = MockRepository::new();
//!     let service = Auditor::new(Arc::new(repo.clone()));
//!     service.log_action(&Context::background(), login_entry("u1")).await.unwrap();
//!     assert_eq!(repo.calls().insert, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
