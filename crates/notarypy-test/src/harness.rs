//! Test harness helpers.

use std::sync::Arc;

use notarypy_core::{
    AttestationSource, BadgeRenderer, BadgeResolver, DEFAULT_BADGE_LABEL, DEFAULT_BADGE_URL,
    RequestParser,
};

/// Resolver with the default parser and shields.io renderer.
///
/// # Panics
///
/// Panics if the default badge URL fails to parse.
#[must_use]
pub fn test_resolver(source: Arc<dyn AttestationSource>) -> BadgeResolver {
    let renderer = BadgeRenderer::new(DEFAULT_BADGE_URL, DEFAULT_BADGE_LABEL)
        .expect("default badge URL is valid");
    BadgeResolver::new(RequestParser::default(), source, renderer)
}
