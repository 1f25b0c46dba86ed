//! Configuration types for the badge service.
//!
//! These types mirror the domain types of `notarypy-core` without depending
//! on it; the gateway's bridge module converts between the two. Every
//! struct implements [`Default`] with the same values as `defaults.toml`,
//! so a bare `[section]` header produces a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package index used for provenance lookups.
    pub index: IndexSection,
    /// Badge rendering service.
    pub badge: BadgeSection,
    /// Recognized request paths.
    pub routing: RoutingSection,
    /// HTTP gateway settings.
    pub gateway: GatewaySection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Package index endpoint and lookup limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    /// Origin of the index; `/integrity/...` paths are appended to it.
    pub base_url: String,
    /// Upper bound on one provenance lookup, in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` sent to the index. Unset means the built-in agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            base_url: "https://pypi.org".to_owned(),
            timeout_secs: 5,
            user_agent: None,
        }
    }
}

/// Badge service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeSection {
    /// Origin of the badge service.
    pub base_url: String,
    /// Left-hand label on every badge.
    pub label: String,
}

impl Default for BadgeSection {
    fn default() -> Self {
        Self {
            base_url: "https://img.shields.io".to_owned(),
            label: "PyPI_Attestation".to_owned(),
        }
    }
}

/// Path prefixes that introduce a path-mode badge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    /// Tried in order; the first prefix found in the path wins.
    pub prefixes: Vec<String>,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            prefixes: vec![
                "/.netlify/functions/badge/".to_owned(),
                "/functions/badge/".to_owned(),
                "/badge/".to_owned(),
            ],
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_owned(),
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["notarypy_core=debug",
    /// "hyper=warn"]`).
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
