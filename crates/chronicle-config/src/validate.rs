//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold. Negative retry
//! counts and delays never reach this point: the fields are unsigned and
//! are rejected while parsing.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, LoggingSection, StoreConfig};

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_store(&config.store)?;
    validate_logging(&config.logging)?;
    Ok(())
}

/// Validate the store section on its own.
///
/// Called by the repository constructor so that a hand-built
/// [`StoreConfig`] gets the same checks as a loaded one.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate_store(store: &StoreConfig) -> ConfigResult<()> {
    require_non_empty("store.uri", &store.uri)?;
    require_non_empty("store.namespace", &store.namespace)?;
    require_non_empty("store.database", &store.database)?;
    require_non_empty("store.collection", &store.collection)?;

    // The collection name is spliced into SurrealQL statements as a table
    // identifier, so it must stay a plain identifier.
    if !is_identifier(&store.collection) {
        return Err(ConfigError::invalid(
            "store.collection",
            format!(
                "'{}' must contain only ASCII letters, digits and '_' and must not start with a digit",
                store.collection
            ),
        ));
    }

    if store.max_pool_size == 0 {
        return Err(ConfigError::invalid(
            "store.max_pool_size",
            "must be greater than 0",
        ));
    }

    if store.min_pool_size > store.max_pool_size {
        return Err(ConfigError::invalid(
            "store.min_pool_size",
            format!(
                "min_pool_size ({}) must not exceed max_pool_size ({})",
                store.min_pool_size, store.max_pool_size
            ),
        ));
    }

    if store.connect_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "store.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    if store.batch_size == 0 {
        return Err(ConfigError::invalid("store.batch_size", "must be positive"));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingSection) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&logging.level.as_str()) {
        return Err(ConfigError::invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&logging.format.as_str()) {
        return Err(ConfigError::invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "cannot be empty"));
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        _ => false,
    }
}
