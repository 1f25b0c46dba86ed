//! Request orchestration.
//!
//! [`BadgeResolver`] runs parse → lookup → render and hands back a
//! [`BadgeResponse`] that adapters translate into their native shape.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::attestation::AttestationResult;
use crate::badge::{BadgeRenderer, BadgeTarget};
use crate::error::RequestError;
use crate::index::AttestationSource;
use crate::request::{BadgeRequest, QueryParams, RequestParser};

/// Plain-text banner served for requests that name no badge route.
pub const USAGE_MESSAGE: &str = "NotaryPy Badge Generator - Use /badge/package/version/filename";

const INTERNAL_ERROR: &str = "Internal server error";

/// Platform-neutral handler outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeResponse {
    /// `200 OK` with the usage banner.
    Usage,
    /// `302 Found` to the badge.
    Redirect(BadgeTarget),
    /// `400 Bad Request` with an error message.
    BadRequest(String),
    /// `500 Internal Server Error` with diagnostics.
    Internal {
        /// Short error summary.
        error: String,
        /// Diagnostic detail.
        details: String,
    },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl BadgeResponse {
    /// A 500 response carrying `details`.
    #[must_use]
    pub fn internal(details: impl std::fmt::Display) -> Self {
        Self::Internal {
            error: INTERNAL_ERROR.to_string(),
            details: details.to_string(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Usage => 200,
            Self::Redirect(_) => 302,
            Self::BadRequest(_) => 400,
            Self::Internal { .. } => 500,
        }
    }

    /// `Location` header value, for redirects.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect(target) => Some(&target.url),
            _ => None,
        }
    }

    /// `Content-Type` header value, if the response has a body.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Usage => Some("text/plain"),
            Self::Redirect(_) => None,
            Self::BadRequest(_) | Self::Internal { .. } => Some("application/json"),
        }
    }

    /// Response body. Errors are JSON objects with `error` (and `details`).
    #[must_use]
    pub fn body(&self) -> String {
        let error = match self {
            Self::Usage => return USAGE_MESSAGE.to_string(),
            Self::Redirect(_) => return String::new(),
            Self::BadRequest(message) => ErrorBody {
                error: message,
                details: None,
            },
            Self::Internal { error, details } => ErrorBody {
                error,
                details: Some(details),
            },
        };
        serde_json::to_string(&error).unwrap_or_else(|_| format!("{{\"error\":\"{INTERNAL_ERROR}\"}}"))
    }
}

/// Verification outcome together with the badge it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Lookup outcome.
    pub attestation: AttestationResult,
    /// Badge to redirect to.
    pub target: BadgeTarget,
}

/// Parses requests, looks up attestations and renders badges.
#[derive(Clone)]
pub struct BadgeResolver {
    parser: RequestParser,
    source: Arc<dyn AttestationSource>,
    renderer: BadgeRenderer,
}

impl std::fmt::Debug for BadgeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeResolver")
            .field("parser", &self.parser)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl BadgeResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(
        parser: RequestParser,
        source: Arc<dyn AttestationSource>,
        renderer: BadgeRenderer,
    ) -> Self {
        Self {
            parser,
            source,
            renderer,
        }
    }

    /// The request parser in use.
    #[must_use]
    pub fn parser(&self) -> &RequestParser {
        &self.parser
    }

    /// Look up and render the badge for an already-parsed request.
    pub async fn resolve(&self, request: &BadgeRequest) -> BadgeTarget {
        self.resolve_detailed(request).await.target
    }

    /// Like [`resolve`](Self::resolve), also returning the lookup outcome.
    pub async fn resolve_detailed(&self, request: &BadgeRequest) -> Resolution {
        let attestation = self.source.lookup(request).await;
        let target = self
            .renderer
            .render(&attestation, request.style.as_deref());

        info!(
            package = %request.package_name,
            version = %request.version,
            filename = %request.filename,
            verified = attestation.verified,
            publisher = attestation.publisher_label.as_deref(),
            redirect_url = %target.url,
            "Resolved badge"
        );

        Resolution {
            attestation,
            target,
        }
    }

    /// Handle a raw request.
    pub async fn handle(&self, path: &str, query: &QueryParams) -> BadgeResponse {
        match self.parser.parse(path, query) {
            Ok(request) => BadgeResponse::Redirect(self.resolve(&request).await),
            Err(RequestError::NotABadgeRoute) => {
                debug!(path, "Not a badge route, serving usage");
                BadgeResponse::Usage
            },
            Err(e) => {
                debug!(path, error = %e, "Rejected badge request");
                BadgeResponse::BadRequest(e.to_string())
            },
        }
    }
}
