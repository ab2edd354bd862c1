//! Chronicle Telemetry - logging setup for the audit trail.
//!
//! Installs a global [`tracing`] subscriber with an [`EnvFilter`]
//! (`tracing_subscriber::EnvFilter`) built from a level plus per-crate
//! directives, writing in one of four formats.
//!
//! # Example
//!
//! ```rust,no_run
//! use chronicle_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), chronicle_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Json)
//!     .with_directive("surrealdb=warn");
//!
//! setup_logging(&config)?;
//! tracing::info!("audit trail ready");
//! # Ok(())
//! # }
//! ```
//!
//! With the `config` feature, a [`LogConfig`] can be built from the
//! `[logging]` section of a `chronicle-config` file.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
