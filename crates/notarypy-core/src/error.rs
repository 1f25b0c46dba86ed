//! Core error types.

use thiserror::Error;

/// Errors raised while turning an inbound request into a [`BadgeRequest`].
///
/// [`BadgeRequest`]: crate::BadgeRequest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request names no badge route and carries no identifiers.
    #[error("Request does not name a badge route")]
    NotABadgeRoute,

    /// One or more of package/version/filename is absent or empty.
    #[error(
        "Missing parameters. Format: /badge/[package]/[version]/[filename] \
         or /badge?package=[package]&version=[version]&filename=[filename]"
    )]
    MissingParameters,

    /// An identifier cannot be placed into a lookup URL.
    #[error("Missing parameters: '{name}' is not usable, {reason}")]
    InvalidParameter {
        /// Parameter name (`package`, `version` or `filename`).
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl RequestError {
    /// Whether this error should be reported to the client as a 400.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::NotABadgeRoute)
    }
}

/// Errors raised while constructing core components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configured base URL is unusable.
    #[error("Invalid {what} URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Which service the URL points at.
        what: &'static str,
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Request parsing failed.
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
