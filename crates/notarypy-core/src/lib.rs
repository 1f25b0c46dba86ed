//! NotaryPy Core - Attestation lookup and badge resolution.
//!
//! This crate answers one question: does a PyPI distribution file have a
//! build-provenance attestation, and who published it? The answer is turned
//! into a shields.io badge URL that hosting adapters redirect to.
//!
//! The pipeline per request is strictly linear:
//!
//! ```text
//! RequestParser  ──►  AttestationSource  ──►  BadgeRenderer
//! (path / query)      (PyPI provenance)       (badge URL)
//! ```
//!
//! [`BadgeResolver`] sequences the three steps and produces a
//! platform-neutral [`BadgeResponse`] that each hosting surface translates
//! into its own response shape.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notarypy_core::prelude::*;
//!
//! # async fn example() -> CoreResult<()> {
//! let source = IndexClient::new(IndexConfig::default())?;
//! let renderer = BadgeRenderer::new(DEFAULT_BADGE_URL, DEFAULT_BADGE_LABEL)?;
//! let resolver = BadgeResolver::new(RequestParser::default(), Arc::new(source), renderer);
//!
//! let response = resolver
//!     .handle("/badge/sampleproject/4.0.0/sampleproject-4.0.0.tar.gz", &QueryParams::default())
//!     .await;
//! println!("{} {:?}", response.status(), response.location());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod attestation;
mod badge;
mod error;
mod handler;
mod index;
mod request;

pub use attestation::{
    AttestationBundle, AttestationResult, GITHUB_PUBLISHER_KIND, ProvenanceDocument, Publisher,
    PublisherClaims,
};
pub use badge::{BadgeColor, BadgeRenderer, BadgeTarget, DEFAULT_BADGE_LABEL, DEFAULT_BADGE_URL};
pub use error::{CoreError, CoreResult, RequestError};
pub use handler::{BadgeResolver, BadgeResponse, Resolution, USAGE_MESSAGE};
pub use index::{
    AttestationSource, DEFAULT_INDEX_URL, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_USER_AGENT, IndexClient,
    IndexConfig,
};
pub use request::{BadgeRequest, DEFAULT_ROUTE_PREFIXES, QueryParams, RequestParser};
