//! Inbound request parsing.
//!
//! A badge request names a distribution file either through the path
//! (`/badge/{package}/{version}/{filename}`) or through query parameters
//! (`?package=..&version=..&filename=..`). Hosting platforms mount the
//! handler under different prefixes, so the parser recognizes an ordered
//! list of them and strips everything up to the first match.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::RequestError;

/// Query parameter carrying the package name.
const PACKAGE_PARAM: &str = "package";
/// Query parameter carrying the release version.
const VERSION_PARAM: &str = "version";
/// Query parameter carrying the distribution filename.
const FILENAME_PARAM: &str = "filename";
/// Query parameter carrying the badge style.
const STYLE_PARAM: &str = "style";

/// Route prefixes recognized out of the box, in match order.
///
/// Function-routing prefixes come first so that `/.netlify/functions/badge/`
/// is not mistaken for a bare `/badge/` mount.
pub const DEFAULT_ROUTE_PREFIXES: &[&str] =
    &["/.netlify/functions/badge/", "/functions/badge/", "/badge/"];

/// A parsed badge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRequest {
    /// Package name as published on the index.
    pub package_name: String,
    /// Release version.
    pub version: String,
    /// Distribution filename (sdist or wheel).
    pub filename: String,
    /// Optional badge style passed through to the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl BadgeRequest {
    /// Build a request, checking that every identifier can be placed into a
    /// lookup URL.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingParameters`] if any identifier is empty
    /// and [`RequestError::InvalidParameter`] if one is a relative path
    /// segment or contains control characters.
    pub fn try_new(
        package_name: impl Into<String>,
        version: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let request = Self {
            package_name: package_name.into(),
            version: version.into(),
            filename: filename.into(),
            style: None,
        };

        validate_identifier(PACKAGE_PARAM, &request.package_name)?;
        validate_identifier(VERSION_PARAM, &request.version)?;
        validate_identifier(FILENAME_PARAM, &request.filename)?;

        Ok(request)
    }

    /// Set the badge style. Empty styles are treated as absent.
    #[must_use]
    pub fn with_style(mut self, style: Option<impl Into<String>>) -> Self {
        self.style = style.map(Into::into).filter(|s: &String| !s.is_empty());
        self
    }
}

fn validate_identifier(name: &'static str, value: &str) -> Result<(), RequestError> {
    if value.is_empty() {
        return Err(RequestError::MissingParameters);
    }

    if matches!(value, "." | "..") {
        return Err(RequestError::InvalidParameter {
            name,
            reason: "relative path segments are not allowed".to_string(),
        });
    }

    if value.chars().any(char::is_control) {
        return Err(RequestError::InvalidParameter {
            name,
            reason: "control characters are not allowed".to_string(),
        });
    }

    Ok(())
}

/// Decoded query parameters. When a key repeats, the first value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Parse a raw `application/x-www-form-urlencoded` query string, with or
    /// without the leading `?`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Look up a parameter, treating an empty value as absent.
    #[must_use]
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Whether no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn names_identifiers(&self) -> bool {
        [PACKAGE_PARAM, VERSION_PARAM, FILENAME_PARAM]
            .iter()
            .any(|name| self.non_empty(name).is_some())
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut map = BTreeMap::new();
        for (key, value) in iter {
            map.entry(key).or_insert(value);
        }
        Self(map)
    }
}

/// Extracts a [`BadgeRequest`] from a request path and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParser {
    prefixes: Vec<String>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTE_PREFIXES.iter().copied())
    }
}

impl RequestParser {
    /// Create a parser recognizing the given prefixes, tried in order.
    /// Empty prefixes are ignored.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// The recognized prefixes, in match order.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Parse a request.
    ///
    /// Query parameters win whenever any of `package`, `version` or
    /// `filename` is present and non-empty; otherwise the path is used.
    ///
    /// # Errors
    ///
    /// - [`RequestError::NotABadgeRoute`] if the path matches no prefix and
    ///   the query names no identifiers.
    /// - [`RequestError::MissingParameters`] if an identifier is absent or
    ///   empty, or the path holds fewer than three segments.
    /// - [`RequestError::InvalidParameter`] if an identifier cannot be
    ///   decoded or placed into a lookup URL.
    pub fn parse(&self, path: &str, query: &QueryParams) -> Result<BadgeRequest, RequestError> {
        let request = if query.names_identifiers() {
            BadgeRequest::try_new(
                query.non_empty(PACKAGE_PARAM).unwrap_or_default(),
                query.non_empty(VERSION_PARAM).unwrap_or_default(),
                query.non_empty(FILENAME_PARAM).unwrap_or_default(),
            )?
        } else {
            let remainder = self
                .route_remainder(path)
                .ok_or(RequestError::NotABadgeRoute)?;
            let (package, version, filename) = split_identifiers(remainder)?;
            BadgeRequest::try_new(
                decode_segment(PACKAGE_PARAM, package)?,
                decode_segment(VERSION_PARAM, version)?,
                decode_segment(FILENAME_PARAM, filename)?,
            )?
        };

        Ok(request.with_style(query.non_empty(STYLE_PARAM)))
    }

    /// Everything after the first occurrence of the first matching prefix.
    fn route_remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find_map(|prefix| path.split_once(prefix.as_str()).map(|(_, rest)| rest))
    }
}

/// First three segments of `{package}/{version}/{filename}[/...]`.
/// Anything after the filename segment is ignored.
fn split_identifiers(remainder: &str) -> Result<(&str, &str, &str), RequestError> {
    let mut segments = remainder.split('/');

    match (segments.next(), segments.next(), segments.next()) {
        (Some(package), Some(version), Some(filename)) => Ok((package, version, filename)),
        _ => Err(RequestError::MissingParameters),
    }
}

fn decode_segment(name: &'static str, raw: &str) -> Result<String, RequestError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| RequestError::InvalidParameter {
            name,
            reason: format!("not valid UTF-8 after percent-decoding: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, query: &str) -> Result<BadgeRequest, RequestError> {
        RequestParser::default().parse(path, &QueryParams::parse(query))
    }

    #[test]
    fn test_parse_public_path() {
        let req = parse("/badge/p/v/f", "").unwrap();
        assert_eq!(req.package_name, "p");
        assert_eq!(req.version, "v");
        assert_eq!(req.filename, "f");
        assert!(req.style.is_none());
    }

    #[test]
    fn test_parse_function_prefixes() {
        let netlify = parse(
            "/.netlify/functions/badge/sampleproject/4.0.0/sampleproject-4.0.0.tar.gz",
            "",
        )
        .unwrap();
        assert_eq!(netlify.package_name, "sampleproject");
        assert_eq!(netlify.filename, "sampleproject-4.0.0.tar.gz");

        let functions = parse("/functions/badge/a/1.0/a-1.0-py3-none-any.whl", "").unwrap();
        assert_eq!(functions.package_name, "a");
        assert_eq!(functions.version, "1.0");
    }

    #[test]
    fn test_parse_prefix_found_mid_path() {
        let req = parse("/api/v1/badge/p/v/f", "").unwrap();
        assert_eq!(req.package_name, "p");
    }

    #[test]
    fn test_parse_trailing_slash() {
        let req = parse("/badge/p/v/f/", "").unwrap();
        assert_eq!(req.filename, "f");
    }

    #[test]
    fn test_parse_percent_encoded_segments() {
        let req = parse("/badge/my%20pkg/1.0%2Bcpu/f.whl", "").unwrap();
        assert_eq!(req.package_name, "my pkg");
        assert_eq!(req.version, "1.0+cpu");
    }

    #[test]
    fn test_parse_too_few_segments() {
        assert_eq!(parse("/badge/p/v", ""), Err(RequestError::MissingParameters));
        assert_eq!(parse("/badge/", ""), Err(RequestError::MissingParameters));
    }

    #[test]
    fn test_parse_empty_segment() {
        assert_eq!(parse("/badge/p//f", ""), Err(RequestError::MissingParameters));
    }

    #[test]
    fn test_parse_extra_segments_ignored() {
        let req = parse("/badge/p/v/f/extra", "").unwrap();
        assert_eq!(req.package_name, "p");
        assert_eq!(req.version, "v");
        assert_eq!(req.filename, "f");

        let req = parse("/badge/p/v/f/a/b/", "").unwrap();
        assert_eq!(req.filename, "f");
    }

    #[test]
    fn test_parse_not_a_badge_route() {
        assert_eq!(parse("/", ""), Err(RequestError::NotABadgeRoute));
        assert_eq!(parse("/badge", ""), Err(RequestError::NotABadgeRoute));
        assert!(!RequestError::NotABadgeRoute.is_client_error());
    }

    #[test]
    fn test_parse_query_parameters() {
        let req = parse("/badge", "package=p&version=v&filename=f&style=flat").unwrap();
        assert_eq!(req.package_name, "p");
        assert_eq!(req.version, "v");
        assert_eq!(req.filename, "f");
        assert_eq!(req.style.as_deref(), Some("flat"));
    }

    #[test]
    fn test_query_parameters_take_precedence() {
        let req = parse("/badge/a/b/c", "?package=p&version=v&filename=f").unwrap();
        assert_eq!(req.package_name, "p");
    }

    #[test]
    fn test_query_missing_identifier() {
        assert_eq!(
            parse("/badge", "package=p&filename=f"),
            Err(RequestError::MissingParameters)
        );
        assert_eq!(
            parse("/", "version=v"),
            Err(RequestError::MissingParameters)
        );
    }

    #[test]
    fn test_empty_query_identifier_falls_back_to_path() {
        let req = parse("/badge/p/v/f", "package=").unwrap();
        assert_eq!(req.package_name, "p");
    }

    #[test]
    fn test_style_from_query_with_path() {
        let req = parse("/badge/p/v/f", "style=flat-square").unwrap();
        assert_eq!(req.style.as_deref(), Some("flat-square"));

        let empty = parse("/badge/p/v/f", "style=").unwrap();
        assert!(empty.style.is_none());
    }

    #[test]
    fn test_relative_segments_rejected() {
        let err = parse("/badge/p/%2E%2E/f", "").unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidParameter {
                name: "version",
                ..
            }
        ));
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("Missing parameters"));
    }

    #[test]
    fn test_control_characters_rejected() {
        let err = parse("/badge", "package=p%0A&version=v&filename=f").unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidParameter {
                name: "package",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = parse("/badge/p/v/%FF", "").unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidParameter {
                name: "filename",
                ..
            }
        ));
    }

    #[test]
    fn test_custom_prefixes() {
        let parser = RequestParser::new(["/attest/", ""]);
        assert_eq!(parser.prefixes(), ["/attest/".to_string()]);

        let req = parser.parse("/attest/p/v/f", &QueryParams::default()).unwrap();
        assert_eq!(req.package_name, "p");
        assert_eq!(
            parser.parse("/badge/p/v/f", &QueryParams::default()),
            Err(RequestError::NotABadgeRoute)
        );
    }

    #[test]
    fn test_query_first_value_wins() {
        let query = QueryParams::parse("style=flat&style=plastic");
        assert_eq!(query.get("style"), Some("flat"));
        assert!(!query.is_empty());
        assert!(QueryParams::parse("").is_empty());
    }

    #[test]
    fn test_try_new_requires_identifiers() {
        assert_eq!(
            BadgeRequest::try_new("p", "", "f"),
            Err(RequestError::MissingParameters)
        );
        assert!(BadgeRequest::try_new("p", "v", "f").is_ok());
    }
}
