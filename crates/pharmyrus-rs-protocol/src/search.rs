//! Search parameters captured from the landing form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Region code used when a submission carries no scope.
pub const DEFAULT_REGION: &str = "BR";

/// Errors raised while validating a search submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The molecule name was empty or whitespace-only.
    #[error("primary term is required")]
    EmptyPrimaryTerm,
    /// A region code is not a two or three letter code.
    #[error("invalid region code: {0:?}")]
    InvalidRegion(String),
}

/// Ordered, duplicate-free set of region codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RegionScope(Vec<String>);

impl RegionScope {
    /// Normalize raw codes, keeping the first occurrence of each.
    ///
    /// Codes are trimmed and upper-cased. Blank entries are skipped, so an
    /// input made only of blanks yields an empty scope.
    pub fn parse<I, S>(codes: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim().to_ascii_uppercase();
            if code.is_empty() {
                continue;
            }
            if !is_region_code(&code) {
                return Err(ValidationError::InvalidRegion(code));
            }
            if !normalized.contains(&code) {
                normalized.push(code);
            }
        }
        Ok(Self(normalized))
    }

    /// Parse codes, substituting `fallback` when nothing remains.
    pub fn parse_or<I, S>(codes: I, fallback: &RegionScope) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope = Self::parse(codes)?;
        if scope.is_empty() {
            return Ok(fallback.clone());
        }
        Ok(scope)
    }

    /// Region codes in insertion order.
    pub fn codes(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for RegionScope {
    fn default() -> Self {
        Self(vec![DEFAULT_REGION.to_string()])
    }
}

impl TryFrom<Vec<String>> for RegionScope {
    type Error = ValidationError;

    fn try_from(codes: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(codes)
    }
}

impl From<RegionScope> for Vec<String> {
    fn from(scope: RegionScope) -> Self {
        scope.0
    }
}

fn is_region_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.bytes().all(|byte| byte.is_ascii_uppercase())
}

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    /// Molecule name.
    pub primary_term: String,
    /// Brand name, possibly blank.
    pub secondary_term: String,
    /// Selected region codes.
    pub scope: Vec<String>,
}

impl SearchForm {
    pub fn new(
        primary_term: impl Into<String>,
        secondary_term: impl Into<String>,
        scope: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            primary_term: primary_term.into(),
            secondary_term: secondary_term.into(),
            scope: scope.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate and normalize the form into search parameters.
    pub fn validate(&self, default_scope: &RegionScope) -> Result<SearchParams, ValidationError> {
        let primary_term = self.primary_term.trim();
        if primary_term.is_empty() {
            return Err(ValidationError::EmptyPrimaryTerm);
        }
        let scope = RegionScope::parse_or(&self.scope, default_scope)?;
        Ok(SearchParams {
            primary_term: primary_term.to_string(),
            secondary_term: self.secondary_term.trim().to_string(),
            scope,
        })
    }
}

/// Validated parameters handed to the search destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Molecule name, trimmed and non-empty.
    pub primary_term: String,
    /// Brand name, empty when not given.
    #[serde(default)]
    pub secondary_term: String,
    /// Regions to search.
    pub scope: RegionScope,
}

/// Pending search persisted while the user authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRecord {
    #[serde(flatten)]
    pub params: SearchParams,
    /// Set by the backend on save. Diagnostic only.
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl IntentRecord {
    pub fn new(params: SearchParams) -> Self {
        Self {
            params,
            captured_at: None,
        }
    }

    /// Return the record stamped with the given capture time.
    pub fn stamped(self, captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at: Some(captured_at),
            ..self
        }
    }

    pub fn into_params(self) -> SearchParams {
        self.params
    }
}
