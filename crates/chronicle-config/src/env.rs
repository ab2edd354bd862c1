//! Environment variable overrides.
//!
//! Each recognised `CHRONICLE_*` variable replaces one leaf of the merged
//! TOML tree before it is deserialized. Values are parsed into the TOML
//! type of the target field; type mismatches surface as validation errors
//! naming the variable.

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by every recognised variable.
pub const ENV_PREFIX: &str = "CHRONICLE_";

#[derive(Debug, Clone, Copy)]
enum Kind {
    Str,
    Int,
    Bool,
}

/// `(variable, section, key, kind)`
const OVERRIDES: &[(&str, &str, &str, Kind)] = &[
    ("CHRONICLE_STORE_URI", "store", "uri", Kind::Str),
    ("CHRONICLE_STORE_NAMESPACE", "store", "namespace", Kind::Str),
    ("CHRONICLE_STORE_DATABASE", "store", "database", Kind::Str),
    ("CHRONICLE_STORE_COLLECTION", "store", "collection", Kind::Str),
    ("CHRONICLE_STORE_MAX_POOL_SIZE", "store", "max_pool_size", Kind::Int),
    ("CHRONICLE_STORE_MIN_POOL_SIZE", "store", "min_pool_size", Kind::Int),
    (
        "CHRONICLE_STORE_CONNECT_TIMEOUT_SECS",
        "store",
        "connect_timeout_secs",
        Kind::Int,
    ),
    ("CHRONICLE_STORE_MAX_RETRIES", "store", "max_retries", Kind::Int),
    ("CHRONICLE_STORE_RETRY_DELAY_MS", "store", "retry_delay_ms", Kind::Int),
    ("CHRONICLE_STORE_BATCH_SIZE", "store", "batch_size", Kind::Int),
    (
        "CHRONICLE_STORE_ENABLE_INDEXES",
        "store",
        "enable_indexes",
        Kind::Bool,
    ),
    ("CHRONICLE_LOG_LEVEL", "logging", "level", Kind::Str),
    ("CHRONICLE_LOG_FORMAT", "logging", "format", Kind::Str),
];

/// Snapshot the process environment, keeping only `CHRONICLE_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply recognised overrides from `env` onto `merged`.
///
/// Returns how many overrides were applied.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if a variable cannot be parsed
/// as the type of the field it targets.
pub fn apply_env_overrides(
    merged: &mut toml::Value,
    env: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied = 0usize;

    for (var, section, key, kind) in OVERRIDES {
        let Some(raw) = env.get(*var) else {
            continue;
        };

        let value = parse_value(var, raw, *kind)?;
        let Some(root) = merged.as_table_mut() else {
            return Err(ConfigError::invalid("<root>", "config root must be a table"));
        };
        let table = root
            .entry((*section).to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
        let Some(table) = table.as_table_mut() else {
            return Err(ConfigError::invalid(*section, "must be a table"));
        };
        table.insert((*key).to_owned(), value);
        applied = applied.saturating_add(1);
    }

    Ok(applied)
}

fn parse_value(var: &str, raw: &str, kind: Kind) -> ConfigResult<toml::Value> {
    let raw = raw.trim();
    match kind {
        Kind::Str => Ok(toml::Value::String(raw.to_owned())),
        Kind::Int => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| ConfigError::invalid(var, format!("'{raw}' is not an integer"))),
        Kind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            _ => Err(ConfigError::invalid(
                var,
                format!("'{raw}' is not a boolean"),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_overrides_replace_leaves() {
        let mut merged: toml::Value = toml::from_str(
            r#"
            [store]
            uri = "ws://localhost:8000"
            max_retries = 3
        "#,
        )
        .unwrap();

        let applied = apply_env_overrides(
            &mut merged,
            &env(&[
                ("CHRONICLE_STORE_URI", "mem://"),
                ("CHRONICLE_STORE_MAX_RETRIES", "7"),
                ("CHRONICLE_STORE_ENABLE_INDEXES", "off"),
            ]),
        )
        .unwrap();

        assert_eq!(applied, 3);
        let store = merged.get("store").unwrap();
        assert_eq!(store.get("uri").unwrap().as_str(), Some("mem://"));
        assert_eq!(store.get("max_retries").unwrap().as_integer(), Some(7));
        assert_eq!(store.get("enable_indexes").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn test_missing_section_is_created() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        apply_env_overrides(&mut merged, &env(&[("CHRONICLE_LOG_LEVEL", "debug")])).unwrap();
        assert_eq!(
            merged
                .get("logging")
                .and_then(|l| l.get("level"))
                .and_then(toml::Value::as_str),
            Some("debug")
        );
    }

    #[test]
    fn test_unparseable_integer_names_variable() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let err = apply_env_overrides(
            &mut merged,
            &env(&[("CHRONICLE_STORE_BATCH_SIZE", "lots")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("CHRONICLE_STORE_BATCH_SIZE"));
    }

    #[test]
    fn test_unknown_variables_ignored() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let applied =
            apply_env_overrides(&mut merged, &env(&[("CHRONICLE_SOMETHING", "x")])).unwrap();
        assert_eq!(applied, 0);
    }
}
