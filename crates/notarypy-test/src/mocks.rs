//! Mock implementations for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use notarypy_core::{AttestationResult, AttestationSource, BadgeRequest};

/// Queue-based [`AttestationSource`] that records every lookup.
///
/// Queued results are returned in order; once the queue is empty the
/// default result is returned.
#[derive(Debug, Clone, Default)]
pub struct MockAttestationSource {
    results: Arc<Mutex<VecDeque<AttestationResult>>>,
    default_result: AttestationResult,
    lookups: Arc<Mutex<Vec<BadgeRequest>>>,
}

impl MockAttestationSource {
    /// Create a mock that reports every file as unverified.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that always returns `result`.
    #[must_use]
    pub fn always(result: AttestationResult) -> Self {
        Self {
            default_result: result,
            ..Self::default()
        }
    }

    /// Queue a result.
    #[must_use]
    pub fn with_result(self, result: AttestationResult) -> Self {
        if let Ok(mut guard) = self.results.lock() {
            guard.push_back(result);
        }
        self
    }

    /// Requests seen so far.
    #[must_use]
    pub fn lookups(&self) -> Vec<BadgeRequest> {
        self.lookups.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of lookups performed.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl AttestationSource for MockAttestationSource {
    async fn lookup(&self, request: &BadgeRequest) -> AttestationResult {
        if let Ok(mut guard) = self.lookups.lock() {
            guard.push(request.clone());
        }

        self.results
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front())
            .unwrap_or_else(|| self.default_result.clone())
    }
}

/// [`AttestationSource`] that panics, for exercising failure isolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingAttestationSource;

#[async_trait]
impl AttestationSource for PanickingAttestationSource {
    async fn lookup(&self, request: &BadgeRequest) -> AttestationResult {
        panic!("lookup exploded for {}", request.package_name);
    }
}
