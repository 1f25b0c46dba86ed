//! Deep merge of TOML values with per-field source tracking.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from an overlay never clobbers the base layer.

use std::collections::HashMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// System-wide configuration (`/etc/notarypy/config.toml`).
    System,
    /// User-level configuration (`~/.notarypy/config.toml`).
    User,
    /// File passed explicitly on the command line.
    Explicit,
    /// Environment variable fallback.
    Environment,
}

impl ConfigLayer {
    /// Whether this layer was read from a config file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::System | Self::User | Self::Explicit)
    }
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Explicit => write!(f, "explicit"),
            Self::Environment => write!(f, "env"),
        }
    }
}

/// Tracks which layer set each field's value, keyed by dotted path.
pub type FieldSources = HashMap<String, ConfigLayer>;

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per field. Scalars and arrays from the overlay replace the
/// base value wholesale.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                match base_table.get_mut(key) {
                    Some(base_val) if overlay_val.is_table() && base_val.is_table() => {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    },
                    Some(base_val) => {
                        *base_val = overlay_val.clone();
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

/// Walk a value tree and record every leaf path with `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}
