//! Badge URL synthesis.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::attestation::AttestationResult;
use crate::error::CoreResult;
use crate::index::parse_base_url;

/// shields.io.
pub const DEFAULT_BADGE_URL: &str = "https://img.shields.io";

/// Left-hand label text on the badge.
pub const DEFAULT_BADGE_LABEL: &str = "PyPI_Attestation";

/// Final redirect target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeTarget {
    /// Fully formed badge-renderer URL.
    pub url: String,
}

/// Badge color keyword understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    /// Attestation found.
    Success,
    /// No attestation.
    Red,
}

impl BadgeColor {
    /// Keyword used in the badge path.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds `{base}/badge/{label}-{message}-{color}.svg[?style=..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRenderer {
    base_url: Url,
    label: String,
}

impl BadgeRenderer {
    /// Create a renderer for the badge service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBaseUrl`](crate::CoreError::InvalidBaseUrl)
    /// if the URL does not parse or cannot carry a path.
    pub fn new(base_url: &str, label: impl Into<String>) -> CoreResult<Self> {
        Ok(Self {
            base_url: parse_base_url("badge", base_url)?,
            label: label.into(),
        })
    }

    /// Message and color for an attestation outcome.
    #[must_use]
    pub fn message(result: &AttestationResult) -> (String, BadgeColor) {
        if !result.verified {
            return ("None".to_string(), BadgeColor::Red);
        }

        let message = match &result.publisher_label {
            Some(label) => format!("Verified_by_{label}"),
            None => "Verified".to_string(),
        };
        (message, BadgeColor::Success)
    }

    /// Render the badge URL. Path and query components are percent-encoded;
    /// letters, digits, `-`, `_` and `.` pass through unchanged.
    #[must_use]
    pub fn render(&self, result: &AttestationResult, style: Option<&str>) -> BadgeTarget {
        let (message, color) = Self::message(result);
        let image = format!("{}-{message}-{color}.svg", self.label);

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["badge", image.as_str()]);
        }

        if let Some(style) = style.filter(|s| !s.is_empty()) {
            url.query_pairs_mut().append_pair("style", style);
        }

        BadgeTarget { url: url.into() }
    }
}
