//! Environment variable fallback and `${VAR}` reference resolution.
//!
//! Env vars are fallbacks, not overrides: they only fill fields that no
//! config file set.

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `NOTARYPY_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "NOTARYPY_INDEX_URL",
        field_path: "index.base_url",
    },
    EnvMapping {
        var_name: "NOTARYPY_INDEX_TIMEOUT_SECS",
        field_path: "index.timeout_secs",
    },
    EnvMapping {
        var_name: "NOTARYPY_USER_AGENT",
        field_path: "index.user_agent",
    },
    EnvMapping {
        var_name: "NOTARYPY_BADGE_URL",
        field_path: "badge.base_url",
    },
    EnvMapping {
        var_name: "NOTARYPY_BADGE_LABEL",
        field_path: "badge.label",
    },
    EnvMapping {
        var_name: "NOTARYPY_ROUTE_PREFIXES",
        field_path: "routing.prefixes",
    },
    EnvMapping {
        var_name: "NOTARYPY_BIND",
        field_path: "gateway.bind",
    },
    EnvMapping {
        var_name: "NOTARYPY_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "NOTARYPY_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Every `(env var, field path)` pair consulted as a fallback.
pub fn env_mappings() -> impl Iterator<Item = (&'static str, &'static str)> {
    ENV_MAPPINGS.iter().map(|m| (m.var_name, m.field_path))
}

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(ConfigLayer::is_file)
        {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            set_field(
                merged,
                mapping.field_path,
                coerce_to_toml_value(mapping.field_path, val),
            );
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Resolve `${VAR}` references within string values in the config tree.
///
/// References that don't resolve are left as-is.
pub fn resolve_env_references<S: ::std::hash::BuildHasher>(
    val: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) {
    match val {
        toml::Value::String(s) => {
            *s = resolve_string_refs(s, env_vars);
        },
        toml::Value::Table(table) => {
            for (_, child) in table.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        toml::Value::Array(arr) => {
            for child in arr.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        _ => {},
    }
}

/// Replace `${VAR}` references in a string with their env var values.
fn resolve_string_refs<S: ::std::hash::BuildHasher>(
    input: &str,
    env_vars: &HashMap<String, String, S>,
) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start.saturating_add(2)..];

        let Some(end) = after.find('}') else {
            // Unterminated reference, keep the remainder verbatim.
            result.push_str(&rest[start..]);
            return result;
        };

        let var_name = &after[..end];
        match env_vars.get(var_name) {
            Some(val) if !var_name.is_empty() => result.push_str(val),
            _ => {
                debug!(var = var_name, "unresolved env var reference in config");
                let _ = write!(result, "${{{var_name}}}");
            },
        }
        rest = &after[end.saturating_add(1)..];
    }

    result.push_str(rest);
    result
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
}

/// Coerce a string env var value to the TOML type of the field it feeds.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    match path {
        "index.timeout_secs" => val
            .trim()
            .parse::<i64>()
            .map_or_else(|_| toml::Value::String(val.to_owned()), toml::Value::Integer),
        "routing.prefixes" => toml::Value::Array(
            val.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| toml::Value::String(p.to_owned()))
                .collect(),
        ),
        _ => toml::Value::String(val.to_owned()),
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
