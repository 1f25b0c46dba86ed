//! Post-merge configuration validation.

use std::net::SocketAddr;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest lookup timeout accepted, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_index(config)?;
    validate_badge(config)?;
    validate_routing(config)?;
    validate_gateway(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_http_url(field: &str, raw: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(raw).map_err(|e| invalid(field, format!("'{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(
            field,
            format!("'{raw}' must use http or https, not '{}'", parsed.scheme()),
        ));
    }
    Ok(())
}

fn validate_index(config: &Config) -> ConfigResult<()> {
    validate_http_url("index.base_url", &config.index.base_url)?;

    let timeout = config.index.timeout_secs;
    if timeout == 0 || timeout > MAX_TIMEOUT_SECS {
        return Err(invalid(
            "index.timeout_secs",
            format!("{timeout} is out of range; must be between 1 and {MAX_TIMEOUT_SECS}"),
        ));
    }

    if config
        .index
        .user_agent
        .as_deref()
        .is_some_and(|ua| ua.trim().is_empty())
    {
        return Err(invalid("index.user_agent", "must not be blank"));
    }
    Ok(())
}

fn validate_badge(config: &Config) -> ConfigResult<()> {
    validate_http_url("badge.base_url", &config.badge.base_url)?;

    let label = &config.badge.label;
    if label.trim().is_empty() {
        return Err(invalid("badge.label", "must not be empty"));
    }
    if label.chars().any(char::is_control) {
        return Err(invalid("badge.label", "must not contain control characters"));
    }
    Ok(())
}

fn validate_routing(config: &Config) -> ConfigResult<()> {
    let prefixes = &config.routing.prefixes;
    if prefixes.is_empty() {
        return Err(invalid("routing.prefixes", "at least one prefix is required"));
    }
    for prefix in prefixes {
        if !prefix.starts_with('/') {
            return Err(invalid(
                "routing.prefixes",
                format!("'{prefix}' must start with '/'"),
            ));
        }
    }
    Ok(())
}

fn validate_gateway(config: &Config) -> ConfigResult<()> {
    config
        .gateway
        .bind
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| invalid("gateway.bind", format!("'{}': {e}", config.gateway.bind)))
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = Config::default();
        config.index.timeout_secs = 0;
        assert_eq!(field_of(validate(&config)), "index.timeout_secs");

        config.index.timeout_secs = MAX_TIMEOUT_SECS.saturating_add(1);
        assert_eq!(field_of(validate(&config)), "index.timeout_secs");

        config.index.timeout_secs = MAX_TIMEOUT_SECS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_index_url_must_be_http() {
        let mut config = Config::default();
        config.index.base_url = "ftp://pypi.org".to_owned();
        assert_eq!(field_of(validate(&config)), "index.base_url");

        config.index.base_url = "not a url".to_owned();
        assert_eq!(field_of(validate(&config)), "index.base_url");
    }

    #[test]
    fn test_blank_user_agent() {
        let mut config = Config::default();
        config.index.user_agent = Some("  ".to_owned());
        assert_eq!(field_of(validate(&config)), "index.user_agent");
    }

    #[test]
    fn test_badge_settings() {
        let mut config = Config::default();
        config.badge.label = String::new();
        assert_eq!(field_of(validate(&config)), "badge.label");

        let mut config = Config::default();
        config.badge.base_url = "mailto:badges@example.com".to_owned();
        assert_eq!(field_of(validate(&config)), "badge.base_url");
    }

    #[test]
    fn test_routing_prefixes() {
        let mut config = Config::default();
        config.routing.prefixes.clear();
        assert_eq!(field_of(validate(&config)), "routing.prefixes");

        config.routing.prefixes = vec!["badge/".to_owned()];
        assert_eq!(field_of(validate(&config)), "routing.prefixes");
    }

    #[test]
    fn test_invalid_bind() {
        let mut config = Config::default();
        config.gateway.bind = "localhost".to_owned();
        assert_eq!(field_of(validate(&config)), "gateway.bind");
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.level");
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
