//! The HTTP gateway.
//!
//! Every method and path lands on one fallback handler; routing between
//! the usage banner and badge requests is the resolver's job.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tracing::{Instrument, error, info};

use notarypy_core::{BadgeResolver, BadgeResponse, QueryParams};
use notarypy_telemetry::RequestContext;

use crate::dispatch::dispatch;
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug)]
struct GatewayState {
    resolver: BadgeResolver,
}

/// Build the axum app serving badge requests.
#[must_use]
pub fn router(resolver: BadgeResolver) -> Router {
    Router::new()
        .fallback(any(badge_handler))
        .with_state(Arc::new(GatewayState { resolver }))
}

/// Bind `addr` and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`GatewayError::BindFailed`] if the address cannot be bound and
/// [`GatewayError::Io`] if the server stops abnormally.
pub async fn serve<F>(addr: SocketAddr, resolver: BadgeResolver, shutdown: F) -> GatewayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::BindFailed { addr, source })?;
    serve_listener(listener, resolver, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`GatewayError::Io`] if the server stops abnormally.
pub async fn serve_listener<F>(
    listener: TcpListener,
    resolver: BadgeResolver,
    shutdown: F,
) -> GatewayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr()?;
    info!(addr = %local, "badge gateway listening");

    axum::serve(listener, router(resolver))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("badge gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C. A failure to install the handler is logged and the
/// future never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn badge_handler(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::new("gateway", uri.path()).with_method(method.as_str());
    let span = ctx.span();

    async move {
        let query = QueryParams::parse(uri.query().unwrap_or_default());
        let response = dispatch(&state.resolver, uri.path().to_owned(), query).await;
        ctx.finish(response.status());
        to_http_response(&response)
    }
    .instrument(span)
    .await
}

/// Convert a handler outcome into an HTTP response.
#[must_use]
pub fn to_http_response(response: &BadgeResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    if let Some(location) = response.location() {
        builder = builder.header(header::LOCATION, location);
    }
    if let Some(content_type) = response.content_type() {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from(response.body()))
        .unwrap_or_else(|e| {
            error!(error = %e, "failed to build response");
            let fallback = BadgeResponse::internal(e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                fallback.body(),
            )
                .into_response()
        })
}
