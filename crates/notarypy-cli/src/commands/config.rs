//! CLI handlers for the `notarypy config` subcommand.

use std::path::Path;

use anyhow::Result;

use notarypy_config::loader::{self, LoadOptions};
use notarypy_config::{ConfigResult, ResolvedConfig, ShowFormat, env};

/// Show the resolved configuration with source annotations.
pub(crate) fn show_config(
    resolved: &ResolvedConfig,
    format: ShowFormat,
    section: Option<&str>,
) -> Result<()> {
    let output = resolved
        .show(format, section)
        .map_err(|e| anyhow::anyhow!("failed to format config: {e}"))?;

    println!("{output}");
    Ok(())
}

/// Report whether the configuration loads and validates.
pub(crate) fn validate_config(loaded: &ConfigResult<ResolvedConfig>) -> Result<()> {
    match loaded {
        Ok(resolved) => {
            println!("Configuration is valid.");
            if !resolved.loaded_files.is_empty() {
                println!("\nLoaded files:");
                for path in &resolved.loaded_files {
                    println!("  - {path}");
                }
            }
            Ok(())
        },
        Err(e) => anyhow::bail!("configuration error: {e}"),
    }
}

/// Show all config file paths that are checked.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn show_paths(explicit: Option<&Path>) -> Result<()> {
    let options = LoadOptions {
        explicit_file: explicit.map(Path::to_path_buf),
        ..LoadOptions::default()
    };

    println!("Configuration files checked (in precedence order):\n");
    for (i, path) in loader::config_paths(&options).iter().enumerate() {
        let status = if path.exists() { "found" } else { "not found" };
        println!("  {}. {}  [{status}]", i.saturating_add(1), path.display());
    }

    println!("\nEnvironment variable fallbacks:");
    for (var, field) in env::env_mappings() {
        println!("  {var:<28} -> {field}");
    }

    Ok(())
}
