//! NotaryPy Test - Shared test utilities.
//!
//! Mock attestation sources, provenance fixtures and a local fake package
//! index, for use as a dev-dependency across the workspace.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notarypy_test::{MockAttestationSource, test_resolver};
//! use notarypy_core::AttestationResult;
//!
//! #[tokio::test]
//! async fn test_verified_badge() {
//!     let source = MockAttestationSource::new()
//!         .with_result(AttestationResult::verified(None));
//!     let resolver = test_resolver(Arc::new(source));
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fake_index;
pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fake_index::*;
pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
