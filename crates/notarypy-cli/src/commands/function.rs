//! `notarypy function`: answer one serverless function event.

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use notarypy_config::Config;
use notarypy_gateway::{config_bridge, handle_event_json};

/// Read an event from stdin and write the response to stdout.
pub(crate) async fn run_function(config: &Config) -> Result<()> {
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("failed to read function event from stdin")?;

    let resolver = config_bridge::build_resolver(config)?;
    let response = handle_event_json(&resolver, &raw).await?;
    println!("{response}");
    Ok(())
}
