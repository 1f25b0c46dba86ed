//! `notarypy serve`: run the HTTP gateway.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use notarypy_config::Config;
use notarypy_gateway::{config_bridge, server};

/// Serve badges until Ctrl-C.
pub(crate) async fn run_serve(config: &Config, bind: Option<&str>) -> Result<()> {
    let addr: SocketAddr = match bind {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid --bind address '{raw}'"))?,
        None => config_bridge::bind_addr(config)?,
    };

    let resolver = config_bridge::build_resolver(config)?;
    tracing::info!(
        index = %config.index.base_url,
        badges = %config.badge.base_url,
        prefixes = ?config.routing.prefixes,
        "starting badge gateway"
    );

    server::serve(addr, resolver, server::ctrl_c()).await?;
    Ok(())
}
