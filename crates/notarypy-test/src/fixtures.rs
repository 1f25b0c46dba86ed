//! Test fixtures for common types and provenance payloads.

use serde_json::{Value, json};

use notarypy_core::BadgeRequest;

/// Package used throughout the fixtures.
pub const TEST_PACKAGE: &str = "sampleproject";
/// Version used throughout the fixtures.
pub const TEST_VERSION: &str = "4.0.0";
/// Filename used throughout the fixtures.
pub const TEST_FILENAME: &str = "sampleproject-4.0.0.tar.gz";

/// Badge path for the fixture file.
#[must_use]
pub fn test_badge_path() -> String {
    format!("/badge/{TEST_PACKAGE}/{TEST_VERSION}/{TEST_FILENAME}")
}

/// Parsed request for the fixture file.
///
/// # Panics
///
/// Never in practice; the fixture identifiers are valid.
#[must_use]
pub fn test_badge_request() -> BadgeRequest {
    BadgeRequest::try_new(TEST_PACKAGE, TEST_VERSION, TEST_FILENAME)
        .expect("fixture identifiers are valid")
}

/// Provenance document with one GitHub-published bundle.
#[must_use]
pub fn github_provenance(repository: &str, workflow: &str) -> Value {
    json!({
        "version": 1,
        "attestation_bundles": [{
            "publisher": {
                "kind": "github",
                "claims": {
                    "repository": repository,
                    "workflow": workflow,
                    "environment": "release"
                }
            },
            "attestations": []
        }]
    })
}

/// Provenance document published by a non-GitHub publisher.
#[must_use]
pub fn gitlab_provenance() -> Value {
    json!({
        "version": 1,
        "attestation_bundles": [{
            "publisher": {
                "kind": "gitlab",
                "claims": {
                    "repository": "group/project",
                    "workflow": ".gitlab-ci.yml"
                }
            },
            "attestations": []
        }]
    })
}

/// Provenance document without an `attestation_bundles` field.
#[must_use]
pub fn bare_provenance() -> Value {
    json!({ "version": 1 })
}
