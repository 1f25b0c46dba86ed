//! Runs the badge handler in isolation from the transport.

use tracing::{Instrument, error};

use notarypy_core::{BadgeResolver, BadgeResponse, QueryParams};

/// Handle one request on its own task.
///
/// A panic inside the handler becomes a `500` carrying the panic message
/// instead of tearing down the connection.
pub async fn dispatch(resolver: &BadgeResolver, path: String, query: QueryParams) -> BadgeResponse {
    let resolver = resolver.clone();
    let task = tokio::spawn(
        async move { resolver.handle(&path, &query).await }.in_current_span(),
    );

    match task.await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "badge handler failed");
            BadgeResponse::internal(e)
        },
    }
}
