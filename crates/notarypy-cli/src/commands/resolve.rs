//! `notarypy resolve`: one lookup from the command line.

use anyhow::Result;
use serde::Serialize;
use tracing::Instrument;

use notarypy_config::Config;
use notarypy_core::{BadgeRequest, Resolution};
use notarypy_gateway::config_bridge;
use notarypy_telemetry::RequestContext;

use crate::OutputFormat;

#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    package: &'a str,
    version: &'a str,
    filename: &'a str,
    verified: bool,
    publisher: Option<&'a str>,
    badge_url: &'a str,
}

impl<'a> ResolveReport<'a> {
    fn new(request: &'a BadgeRequest, resolution: &'a Resolution) -> Self {
        Self {
            package: &request.package_name,
            version: &request.version,
            filename: &request.filename,
            verified: resolution.attestation.verified,
            publisher: resolution.attestation.publisher_label.as_deref(),
            badge_url: &resolution.target.url,
        }
    }
}

fn render(request: &BadgeRequest, resolution: &Resolution, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => resolution.target.url.clone(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&ResolveReport::new(request, resolution))?
        },
    })
}

/// Look up one file and print its badge URL.
pub(crate) async fn run_resolve(
    config: &Config,
    request: BadgeRequest,
    format: OutputFormat,
) -> Result<()> {
    let resolver = config_bridge::build_resolver(config)?;
    let ctx = RequestContext::new(
        "cli",
        format!(
            "{}/{}/{}",
            request.package_name, request.version, request.filename
        ),
    );

    let resolution = async {
        let resolution = resolver.resolve_detailed(&request).await;
        ctx.finish(302);
        resolution
    }
    .instrument(ctx.span())
    .await;

    println!("{}", render(&request, &resolution, format)?);
    Ok(())
}
