//! Package index provenance lookups.
//!
//! Defines the [`AttestationSource`] seam and the reqwest-backed
//! [`IndexClient`] that queries PyPI's integrity API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::attestation::AttestationResult;
use crate::error::{CoreError, CoreResult};
use crate::request::BadgeRequest;

/// Public PyPI.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

/// Upper bound on a single provenance lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// `User-Agent` sent to the index.
pub const DEFAULT_USER_AGENT: &str = concat!("notarypy/", env!("CARGO_PKG_VERSION"));

/// Something that can tell whether a distribution file is attested.
///
/// Implementations never fail: every error is reported as
/// [`AttestationResult::unverified`].
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Look up the attestation for the file named by `request`.
    async fn lookup(&self, request: &BadgeRequest) -> AttestationResult;
}

/// Connection settings for [`IndexClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Base URL of the index (scheme + host, optional path prefix).
    pub base_url: String,
    /// Request timeout; expiry counts as "no attestation".
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDEX_URL.to_string(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl IndexConfig {
    /// Create a config pointing at `base_url` with default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the lookup timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Queries `{base}/integrity/{package}/{version}/{filename}/provenance`.
#[derive(Debug, Clone)]
pub struct IndexClient {
    client: Client,
    base_url: Url,
}

impl IndexClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBaseUrl`] if the base URL does not parse
    /// or cannot carry a path, and [`CoreError::HttpClient`] if the HTTP
    /// client cannot be built.
    pub fn new(config: IndexConfig) -> CoreResult<Self> {
        let base_url = parse_base_url("index", &config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// The provenance URL for a request. Each identifier is encoded as one
    /// path segment.
    #[must_use]
    pub fn provenance_url(&self, request: &BadgeRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "integrity",
                request.package_name.as_str(),
                request.version.as_str(),
                request.filename.as_str(),
                "provenance",
            ]);
        }
        url
    }
}

#[async_trait]
impl AttestationSource for IndexClient {
    async fn lookup(&self, request: &BadgeRequest) -> AttestationResult {
        let url = self.provenance_url(request);
        debug!(url = %url, "Checking provenance");

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, timeout = e.is_timeout(), "Attestation check error");
                return AttestationResult::unverified();
            },
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %url, status = %status, "No attestation");
            return AttestationResult::unverified();
        }

        match response.bytes().await {
            Ok(body) => AttestationResult::from_provenance_body(&body),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read provenance body");
                AttestationResult::unverified()
            },
        }
    }
}

/// Parse a service base URL, rejecting ones that cannot take path segments.
pub(crate) fn parse_base_url(what: &'static str, raw: &str) -> CoreResult<Url> {
    let invalid = |reason: String| CoreError::InvalidBaseUrl {
        what,
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BadgeRequest {
        BadgeRequest::try_new("sampleproject", "4.0.0", "sampleproject-4.0.0.tar.gz").unwrap()
    }

    #[test]
    fn test_provenance_url() {
        let client = IndexClient::new(IndexConfig::default()).unwrap();
        assert_eq!(
            client.provenance_url(&request()).as_str(),
            "https://pypi.org/integrity/sampleproject/4.0.0/sampleproject-4.0.0.tar.gz/provenance"
        );
    }

    #[test]
    fn test_provenance_url_with_base_path() {
        let client = IndexClient::new(IndexConfig::new("https://mirror.example/pypi/")).unwrap();
        assert_eq!(
            client.provenance_url(&request()).as_str(),
            "https://mirror.example/pypi/integrity/sampleproject/4.0.0/sampleproject-4.0.0.tar.gz/provenance"
        );
    }

    #[test]
    fn test_provenance_url_encodes_identifiers() {
        let client = IndexClient::new(IndexConfig::default()).unwrap();
        let req = BadgeRequest::try_new("my pkg", "1.0+cpu", "a/b?c#d").unwrap();
        assert_eq!(
            client.provenance_url(&req).as_str(),
            "https://pypi.org/integrity/my%20pkg/1.0+cpu/a%2Fb%3Fc%23d/provenance"
        );
    }

    #[test]
    fn test_invalid_base_urls() {
        for raw in ["not a url", "mailto:someone@example.com", "ftp://example.com"] {
            let err = IndexClient::new(IndexConfig::new(raw)).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidBaseUrl { what: "index", .. }),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_config_builder() {
        let config = IndexConfig::new("http://localhost:9000")
            .with_timeout(Duration::from_secs(2))
            .with_user_agent("test-agent");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(IndexConfig::default().timeout, DEFAULT_LOOKUP_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unreachable_index_is_unverified() {
        // Port 9 (discard) on localhost is closed on test machines.
        let client = IndexClient::new(
            IndexConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        assert_eq!(
            client.lookup(&request()).await,
            AttestationResult::unverified()
        );
    }
}
