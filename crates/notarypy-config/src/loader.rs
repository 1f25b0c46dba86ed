//! Config file discovery and layered loading.
//!
//! `load()` runs these steps in order:
//! 1. Parse `defaults.toml` into the base tree
//! 2. Merge `/etc/notarypy/config.toml` (system)
//! 3. Merge `$NOTARYPY_HOME/config.toml`, or `~/.notarypy/config.toml` (user)
//! 4. Merge the file given with `--config` (explicit)
//! 5. Apply `NOTARYPY_*` env var fallbacks for fields no file set
//! 6. Resolve `${VAR}` references and deserialize into [`Config`]
//! 7. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::env::{apply_env_fallbacks, collect_env_vars, resolve_env_references};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/notarypy/config.toml";

/// Directory under the home directory holding the user config.
pub const USER_CONFIG_DIR: &str = ".notarypy";

/// Env var naming an alternative user config directory.
pub const HOME_ENV_VAR: &str = "NOTARYPY_HOME";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Where [`load`] looks for config files.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Extra file merged above the system and user layers. It must exist.
    pub explicit_file: Option<PathBuf>,
    /// Directory to treat as the user config directory, bypassing home
    /// discovery and `NOTARYPY_HOME`.
    pub user_dir_override: Option<PathBuf>,
    /// Skip `/etc/notarypy/config.toml`.
    pub skip_system: bool,
}

/// Load the configuration with layered file precedence.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, the explicit
/// file is missing, or the merged configuration fails validation.
pub fn load(options: &LoadOptions) -> ConfigResult<ResolvedConfig> {
    load_with_env(options, &collect_env_vars())
}

/// [`load`] with an explicit environment instead of the process environment.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    options: &LoadOptions,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    let mut layers: Vec<(PathBuf, ConfigLayer, toml::Value)> = Vec::new();

    if !options.skip_system {
        let system_path = PathBuf::from(SYSTEM_CONFIG_PATH);
        if let Some(overlay) = try_load_file(&system_path)? {
            layers.push((system_path, ConfigLayer::System, overlay));
        }
    }

    if let Some((path, overlay)) = load_user_layer(options, env_vars)? {
        layers.push((path, ConfigLayer::User, overlay));
    }

    if let Some(path) = &options.explicit_file {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        layers.push((path.clone(), ConfigLayer::Explicit, overlay));
    }

    for (path, layer, overlay) in layers {
        deep_merge_tracking(&mut merged, &overlay, "", &layer, &mut field_sources);
        info!(path = %path.display(), layer = %layer, "loaded config file");
        loaded_files.push(path.display().to_string());
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    resolve_env_references(&mut merged, env_vars);
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path, over the defaults only.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;

    let config: Config = overlay
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Every config file path consulted by [`load`], in precedence order
/// (lowest first). Paths are listed whether or not they exist.
#[must_use]
pub fn config_paths(options: &LoadOptions) -> Vec<PathBuf> {
    config_paths_with_env(options, &collect_env_vars())
}

/// [`config_paths`] with an explicit environment.
#[must_use]
pub fn config_paths_with_env<S: ::std::hash::BuildHasher>(
    options: &LoadOptions,
    env_vars: &HashMap<String, String, S>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if !options.skip_system {
        paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    }
    if let Some(dir) = user_config_dir(options, env_vars) {
        paths.push(dir.join("config.toml"));
    }
    if let Some(explicit) = &options.explicit_file {
        paths.push(explicit.clone());
    }
    paths
}

/// The user config directory: the override, then a valid
/// `NOTARYPY_HOME`, then `~/.notarypy`.
fn user_config_dir<S: ::std::hash::BuildHasher>(
    options: &LoadOptions,
    env_vars: &HashMap<String, String, S>,
) -> Option<PathBuf> {
    if let Some(dir) = &options.user_dir_override {
        return Some(dir.clone());
    }

    let home_dir = match home_directory() {
        Ok(home) => home,
        Err(e) => {
            debug!(error = %e, "skipping user config");
            return None;
        },
    };

    if let Some(raw) = env_vars.get(HOME_ENV_VAR) {
        if let Some(dir) = validate_user_dir(raw, &home_dir) {
            return Some(dir);
        }
        warn!(
            path = raw.as_str(),
            "NOTARYPY_HOME is not a directory owned by the current user; ignoring"
        );
    }

    Some(home_dir.join(USER_CONFIG_DIR))
}

fn load_user_layer<S: ::std::hash::BuildHasher>(
    options: &LoadOptions,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Option<(PathBuf, toml::Value)>> {
    let Some(dir) = user_config_dir(options, env_vars) else {
        return Ok(None);
    };
    let path = dir.join("config.toml");
    Ok(try_load_file(&path)?.map(|overlay| (path, overlay)))
}

/// Read and parse a TOML file, returning `None` if it doesn't exist.
///
/// Reads once and checks the size afterwards, so there is no window between
/// a stat and the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Check that a `NOTARYPY_HOME` path is a real directory owned by the same
/// user who owns `home_dir`. Returns the canonicalized path.
fn validate_user_dir(raw_path: &str, home_dir: &Path) -> Option<PathBuf> {
    let canonical = PathBuf::from(raw_path).canonicalize().ok()?;

    if !canonical.is_dir() {
        return None;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let dir_uid = canonical.metadata().ok()?.uid();
        let home_uid = home_dir.metadata().ok()?.uid();
        if dir_uid != home_uid {
            return None;
        }
    }

    #[cfg(not(unix))]
    let _ = home_dir;

    Some(canonical)
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated(dir: &Path) -> LoadOptions {
        LoadOptions {
            explicit_file: None,
            user_dir_override: Some(dir.to_path_buf()),
            skip_system: true,
        }
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_defaults_only() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_with_env(&isolated(dir.path()), &no_env()).unwrap();

        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("index.base_url"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_user_then_explicit_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[index]\ntimeout_secs = 10\nbase_url = \"http://user.example\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&explicit, "[index]\ntimeout_secs = 20\n").unwrap();

        let mut options = isolated(dir.path());
        options.explicit_file = Some(explicit);
        let resolved = load_with_env(&options, &no_env()).unwrap();

        assert_eq!(resolved.config.index.timeout_secs, 20);
        assert_eq!(resolved.config.index.base_url, "http://user.example");
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.field_sources.get("index.timeout_secs"),
            Some(&ConfigLayer::Explicit)
        );
        assert_eq!(
            resolved.field_sources.get("index.base_url"),
            Some(&ConfigLayer::User)
        );
    }

    #[test]
    fn test_env_fills_unset_fields_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[gateway]\nbind = \"0.0.0.0:9000\"\n")
            .unwrap();
        let env: HashMap<String, String> = [
            ("NOTARYPY_BIND", "0.0.0.0:1"),
            ("NOTARYPY_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let resolved = load_with_env(&isolated(dir.path()), &env).unwrap();

        assert_eq!(resolved.config.gateway.bind, "0.0.0.0:9000");
        assert_eq!(resolved.config.logging.level, "debug");
        assert_eq!(
            resolved.field_sources.get("logging.level"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_var_references_resolved() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[index]\nbase_url = \"http://${MIRROR_HOST}\"\n",
        )
        .unwrap();
        let env: HashMap<String, String> =
            HashMap::from([("MIRROR_HOST".to_owned(), "mirror.local:8080".to_owned())]);

        let resolved = load_with_env(&isolated(dir.path()), &env).unwrap();
        assert_eq!(resolved.config.index.base_url, "http://mirror.local:8080");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = isolated(dir.path());
        options.explicit_file = Some(dir.path().join("absent.toml"));

        let result = load_with_env(&options, &no_env());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[index]\ntimeout_secs = 0\n").unwrap();

        let result = load_with_env(&isolated(dir.path()), &no_env());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[index\n").unwrap();

        let result = load_with_env(&isolated(dir.path()), &no_env());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("only.toml");
        std::fs::write(&path, "[badge]\nlabel = \"Provenance\"\n").unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.badge.label, "Provenance");
        assert_eq!(config.badge.base_url, "https://img.shields.io");
    }

    #[test]
    fn test_try_load_file_missing() {
        let result = try_load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "Expected ValidationError for oversized config, got: {result:?}"
        );
    }

    #[test]
    fn test_config_paths_order() {
        let options = LoadOptions {
            explicit_file: Some(PathBuf::from("/tmp/explicit.toml")),
            user_dir_override: Some(PathBuf::from("/tmp/user")),
            skip_system: false,
        };
        let paths = config_paths(&options);
        assert_eq!(
            paths,
            vec![
                PathBuf::from(SYSTEM_CONFIG_PATH),
                PathBuf::from("/tmp/user/config.toml"),
                PathBuf::from("/tmp/explicit.toml"),
            ]
        );
    }

    #[test]
    fn test_notarypy_home_takes_priority() {
        let Ok(home) = home_directory() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[badge]\nlabel = \"FromHome\"\n",
        )
        .unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let env = HashMap::from([(
            HOME_ENV_VAR.to_owned(),
            dir.path().display().to_string(),
        )]);
        let options = LoadOptions {
            skip_system: true,
            ..LoadOptions::default()
        };

        if validate_user_dir(&dir.path().display().to_string(), &home).is_none() {
            // Temp dir owned by someone other than the home directory's owner.
            return;
        }
        assert_eq!(
            config_paths_with_env(&options, &env),
            vec![canonical.join("config.toml")]
        );

        let resolved = load_with_env(&options, &env).unwrap();
        assert_eq!(resolved.config.badge.label, "FromHome");
        assert_eq!(
            resolved.field_sources.get("badge.label"),
            Some(&ConfigLayer::User)
        );
    }

    #[test]
    fn test_invalid_notarypy_home_falls_back_to_home_dir() {
        let Ok(home) = home_directory() else {
            return;
        };
        let env = HashMap::from([(
            HOME_ENV_VAR.to_owned(),
            "/nonexistent/notarypy-home".to_owned(),
        )]);
        let options = LoadOptions {
            skip_system: true,
            ..LoadOptions::default()
        };

        assert_eq!(
            config_paths_with_env(&options, &env),
            vec![home.join(USER_CONFIG_DIR).join("config.toml")]
        );
    }
}
