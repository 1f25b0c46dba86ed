//! Per-request context for log correlation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and timing of one badge request.
///
/// Every entry point (HTTP gateway, function adapter, CLI) creates one of
/// these and runs the request inside [`RequestContext::span`], so lookup
/// warnings emitted deep in the resolver carry the request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: Uuid,
    /// When the request started.
    pub started_at: DateTime<Utc>,
    /// Entry point that accepted the request (e.g. `gateway`).
    pub source: String,
    /// HTTP method, when there is one.
    pub method: Option<String>,
    /// Request path as received.
    pub path: String,
}

impl RequestContext {
    /// Create a context for a request on `path`.
    #[must_use]
    pub fn new(source: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            source: source.into(),
            method: None,
            path: path.into(),
        }
    }

    /// Set the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Get elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        // started_at is taken at construction, so this is never negative.
        #[allow(clippy::arithmetic_side_effects)]
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds()
    }

    /// Create a tracing span carrying this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.short_id(),
            source = %self.source,
            method = self.method.as_deref(),
            path = %self.path,
        )
    }

    /// Log the outcome of the request. Call inside [`RequestContext::span`].
    pub fn finish(&self, status: u16) {
        let elapsed_ms = self.elapsed_ms();
        if status >= 500 {
            tracing::error!(status, elapsed_ms, "request failed");
        } else {
            tracing::info!(status, elapsed_ms, "request completed");
        }
    }

    /// Get a short identifier for logging.
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.request_id.simple().to_string();
        id.truncate(8);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_creation() {
        let ctx = RequestContext::new("gateway", "/badge/p/v/f").with_method("GET");
        assert_eq!(ctx.source, "gateway");
        assert_eq!(ctx.path, "/badge/p/v/f");
        assert_eq!(ctx.method.as_deref(), Some("GET"));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestContext::new("gateway", "/");
        let b = RequestContext::new("gateway", "/");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_short_id() {
        let ctx = RequestContext::new("cli", "/");
        let short = ctx.short_id();
        assert_eq!(short.len(), 8);
        assert!(ctx.request_id.simple().to_string().starts_with(&short));
    }

    #[test]
    fn test_elapsed_is_non_negative() {
        let ctx = RequestContext::new("cli", "/");
        assert!(ctx.elapsed_ms() >= 0);
    }

    #[test]
    fn test_finish_inside_span() {
        let ctx = RequestContext::new("function", "/badge");
        let _entered = ctx.span().entered();
        ctx.finish(302);
        ctx.finish(500);
    }

    #[test]
    fn test_serialization() {
        let ctx = RequestContext::new("gateway", "/badge").with_method("HEAD");
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, ctx.request_id);
        assert_eq!(parsed.method.as_deref(), Some("HEAD"));
    }
}
