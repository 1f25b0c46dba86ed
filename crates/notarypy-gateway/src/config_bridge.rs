//! Bridge from `notarypy_config::Config` to domain types.
//!
//! The config crate has no dependencies on other internal crates, so the
//! conversions live here where the gateway and the CLI can share them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use notarypy_config::Config;
use notarypy_core::{BadgeRenderer, BadgeResolver, IndexClient, IndexConfig, RequestParser};
use notarypy_telemetry::{LogConfig, LogFormat};

use crate::error::{GatewayError, GatewayResult};

/// Convert config to [`IndexConfig`].
#[must_use]
pub fn to_index_config(cfg: &Config) -> IndexConfig {
    let index = IndexConfig::new(&cfg.index.base_url)
        .with_timeout(Duration::from_secs(cfg.index.timeout_secs));
    match &cfg.index.user_agent {
        Some(user_agent) => index.with_user_agent(user_agent),
        None => index,
    }
}

/// Convert config to a [`RequestParser`].
#[must_use]
pub fn to_request_parser(cfg: &Config) -> RequestParser {
    RequestParser::new(cfg.routing.prefixes.iter().map(String::as_str))
}

/// Build the resolver backed by the real index client.
///
/// # Errors
///
/// Returns an error if a base URL is unusable or the HTTP client cannot be
/// built.
pub fn build_resolver(cfg: &Config) -> GatewayResult<BadgeResolver> {
    let client = IndexClient::new(to_index_config(cfg))?;
    let renderer = BadgeRenderer::new(&cfg.badge.base_url, cfg.badge.label.as_str())?;
    Ok(BadgeResolver::new(
        to_request_parser(cfg),
        Arc::new(client),
        renderer,
    ))
}

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = match cfg.logging.format.as_str() {
        "pretty" => LogFormat::Pretty,
        "json" => LogFormat::Json,
        "full" => LogFormat::Full,
        _ => LogFormat::Compact,
    };

    cfg.logging
        .directives
        .iter()
        .fold(LogConfig::new(&cfg.logging.level).with_format(format), |log, d| {
            log.with_directive(d)
        })
}

/// Parse the configured bind address.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidBind`] if the address does not parse.
pub fn bind_addr(cfg: &Config) -> GatewayResult<SocketAddr> {
    cfg.gateway
        .bind
        .parse()
        .map_err(|source| GatewayError::InvalidBind {
            addr: cfg.gateway.bind.clone(),
            source,
        })
}
