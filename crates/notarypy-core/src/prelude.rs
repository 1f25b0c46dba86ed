//! Prelude module - commonly used types for convenient import.
//!
//! Use `use notarypy_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult, RequestError};

// Request parsing
pub use crate::{BadgeRequest, DEFAULT_ROUTE_PREFIXES, QueryParams, RequestParser};

// Attestation lookup
pub use crate::{AttestationResult, AttestationSource, IndexClient, IndexConfig};

// Badge rendering
pub use crate::{BadgeRenderer, BadgeTarget, DEFAULT_BADGE_LABEL, DEFAULT_BADGE_URL};

// Orchestration
pub use crate::{BadgeResolver, BadgeResponse, Resolution};
