#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for Chronicle.
//!
//! This crate provides the [`Config`] type with its [`StoreConfig`] and
//! [`LoggingSection`] sections, layered loading and validation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use chronicle_config::Config;
//!
//! // defaults → file → CHRONICLE_* environment overrides → validation
//! let config = Config::load(Some(std::path::Path::new("chronicle.toml"))).unwrap();
//! println!("writing audit entries to {}", config.store.collection);
//! ```
//!
//! # Environment
//!
//! `CHRONICLE_CONFIG` names a config file when no path is given.
//! `CHRONICLE_STORE_*` and `CHRONICLE_LOG_*` override single fields, e.g.
//! `CHRONICLE_STORE_URI=mem://`.
//!
//! # Design
//!
//! This crate has **no dependencies on other internal chronicle crates**.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from defaults, an optional file and the
    /// environment.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed or the final
    /// configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::ValidationError`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}

impl StoreConfig {
    /// Validate the store settings on their own.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::ValidationError`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate_store(self)
    }
}
