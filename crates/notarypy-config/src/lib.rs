#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Layered configuration for the NotaryPy badge service.
//!
//! # Usage
//!
//! ```rust,no_run
//! use notarypy_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("Index: {}", resolved.config.index.base_url);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit** file passed with `--config`
//! 2. **User** (`~/.notarypy/config.toml` or `$NOTARYPY_HOME/config.toml`)
//! 3. **System** (`/etc/notarypy/config.toml`)
//! 4. **Environment variables** (`NOTARYPY_*`), fallback only
//! 5. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate does not depend on the other notarypy crates. Conversion to
//! domain types happens in the gateway's bridge module.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with source tracking.
pub mod merge;
/// Resolved configuration display and serialization.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::LoadOptions;
pub use merge::{ConfigLayer, FieldSources};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain, optionally adding
    /// an explicit file on top.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit_file: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions {
            explicit_file: explicit_file.map(std::path::Path::to_path_buf),
            ..LoadOptions::default()
        })
    }

    /// Load configuration from a single file over the defaults (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Check an assembled configuration against the validation rules.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}
