//! Serverless function adapter.
//!
//! Hosted function platforms hand the handler an event with the request
//! path and decoded query parameters, and expect a `{ statusCode, headers,
//! body }` object back. Both are JSON with camelCase keys.
//!
//! The event path is already percent-decoded by the platform, so it is
//! re-escaped before parsing and a literal `%xx` in a filename survives.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use notarypy_core::{BadgeResolver, BadgeResponse, QueryParams};
use notarypy_telemetry::RequestContext;

use crate::dispatch::dispatch;
use crate::error::GatewayResult;

/// Incoming function event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    /// Request path as seen by the platform.
    #[serde(default)]
    pub path: String,
    /// HTTP method, when the platform supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// Decoded query parameters; platforms send `null` when there are none.
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

impl FunctionEvent {
    /// Event for a bare path with no query.
    #[must_use]
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }
}

/// Outgoing function response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    #[serde(default)]
    pub body: String,
}

impl From<&BadgeResponse> for FunctionResponse {
    fn from(response: &BadgeResponse) -> Self {
        let mut headers = BTreeMap::new();
        if let Some(location) = response.location() {
            headers.insert("Location".to_owned(), location.to_owned());
        }
        if let Some(content_type) = response.content_type() {
            headers.insert("Content-Type".to_owned(), content_type.to_owned());
        }
        Self {
            status_code: response.status(),
            headers,
            body: response.body(),
        }
    }
}

/// Handle one function event.
pub async fn handle_event(resolver: &BadgeResolver, event: FunctionEvent) -> FunctionResponse {
    let mut ctx = RequestContext::new("function", event.path.as_str());
    if let Some(method) = &event.http_method {
        ctx = ctx.with_method(method.as_str());
    }
    let span = ctx.span();

    async move {
        let query: QueryParams = event
            .query_string_parameters
            .unwrap_or_default()
            .into_iter()
            .collect();
        let response = dispatch(resolver, escape_decoded_path(&event.path), query).await;
        ctx.finish(response.status());
        FunctionResponse::from(&response)
    }
    .instrument(span)
    .await
}

/// Escape `%` so the parser's percent-decoding yields the path unchanged.
fn escape_decoded_path(path: &str) -> String {
    path.replace('%', "%25")
}

/// Decode a JSON event, handle it and encode the JSON response.
///
/// # Errors
///
/// Returns [`crate::GatewayError::InvalidEvent`] if `raw` is not a valid
/// event.
pub async fn handle_event_json(resolver: &BadgeResolver, raw: &str) -> GatewayResult<String> {
    let event: FunctionEvent = serde_json::from_str(raw)?;
    let response = handle_event(resolver, event).await;
    Ok(serde_json::to_string(&response)?)
}
