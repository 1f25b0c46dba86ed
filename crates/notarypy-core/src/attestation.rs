//! Attestation outcomes and the partial shape of PyPI provenance documents.
//!
//! The provenance payload comes from an external service, so every field is
//! optional and a field of the wrong type is treated as absent. Nothing in
//! here can fail: an unexpected shape only ever drops the publisher label.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Publisher kind that yields a publisher label.
pub const GITHUB_PUBLISHER_KIND: &str = "github";

/// Workflow filename suffix stripped from the label.
const WORKFLOW_SUFFIX: &str = ".yml";

/// Outcome of an attestation lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationResult {
    /// Whether the index returned a provenance document.
    pub verified: bool,
    /// `{repository}_{workflow}` for recognized publishers.
    ///
    /// Only ever set when `verified` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_label: Option<String>,
}

impl AttestationResult {
    /// No attestation exists (or none could be confirmed).
    #[must_use]
    pub fn unverified() -> Self {
        Self::default()
    }

    /// An attestation exists, optionally with a publisher label.
    #[must_use]
    pub fn verified(publisher_label: Option<String>) -> Self {
        Self {
            verified: true,
            publisher_label,
        }
    }

    /// Classify the body of a `200 OK` provenance response.
    ///
    /// A body that is not JSON counts as unverified. Any JSON body counts as
    /// verified; the label is derived only when the first bundle carries a
    /// GitHub publisher.
    #[must_use]
    pub fn from_provenance_body(body: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "provenance body is not JSON");
                return Self::unverified();
            },
        };

        let document = ProvenanceDocument::deserialize(&value).unwrap_or_default();
        Self::verified(document.publisher_label())
    }
}

/// Top-level provenance document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvenanceDocument {
    /// Attestation bundles; entries that fail to parse are kept as `None`
    /// so positions are preserved.
    #[serde(default, deserialize_with = "lenient_items")]
    pub attestation_bundles: Option<Vec<Option<AttestationBundle>>>,
}

impl ProvenanceDocument {
    /// Publisher of the first bundle, if it parsed.
    #[must_use]
    pub fn first_publisher(&self) -> Option<&Publisher> {
        self.attestation_bundles
            .as_deref()?
            .first()?
            .as_ref()?
            .publisher
            .as_ref()
    }

    /// Label for the first bundle's publisher.
    #[must_use]
    pub fn publisher_label(&self) -> Option<String> {
        self.first_publisher().and_then(Publisher::label)
    }
}

/// One attestation bundle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttestationBundle {
    /// Trusted publisher that produced the attestations.
    #[serde(default, deserialize_with = "lenient")]
    pub publisher: Option<Publisher>,
}

/// Trusted publisher identity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Publisher {
    /// Publisher kind, e.g. `github` or `gitlab`.
    #[serde(default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    /// Kind-specific claims.
    #[serde(default, deserialize_with = "lenient")]
    pub claims: Option<PublisherClaims>,
}

impl Publisher {
    /// Build `{repo}_{workflow}` for GitHub publishers.
    ///
    /// `repo` is the last path segment of `claims.repository` and `workflow`
    /// is `claims.workflow` with a trailing `.yml` removed. Missing claims
    /// become empty strings. Other kinds produce no label.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        if self.kind.as_deref() != Some(GITHUB_PUBLISHER_KIND) {
            return None;
        }

        let claims = self.claims.as_ref();
        let repository = claims
            .and_then(|c| c.repository.as_deref())
            .unwrap_or_default();
        let repo = repository.rsplit('/').next().unwrap_or_default();

        let workflow = claims
            .and_then(|c| c.workflow.as_deref())
            .unwrap_or_default();
        let workflow = workflow.strip_suffix(WORKFLOW_SUFFIX).unwrap_or(workflow);

        Some(format!("{repo}_{workflow}"))
    }
}

/// Claims for a publisher. Only the fields used for labelling are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherClaims {
    /// `owner/name` of the source repository.
    #[serde(default, deserialize_with = "lenient")]
    pub repository: Option<String>,
    /// Workflow filename.
    #[serde(default, deserialize_with = "lenient")]
    pub workflow: Option<String>,
}

/// Deserialize a field, mapping a value of the wrong shape to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Like [`lenient`], but applied element-wise to a list.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Option<Vec<Option<T>>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(items) = lenient::<D, Vec<Value>>(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        items
            .into_iter()
            .map(|item| T::deserialize(item).ok())
            .collect(),
    ))
}
