//! Identifier types.
//!
//! - [`TraceId`]: names a unit of work whose log lines are attributed to it,
//!   typically a content digest such as `sha256:3f2a...`.
//! - [`ClaimantId`]: names the operation that currently owns a trace id's
//!   log output.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a unit of work (a build vertex, a step, ...).
///
/// Immutable once created. Any string is accepted by [`TraceId::new`];
/// [`TraceId::parse`] additionally enforces the `algorithm:hex` digest
/// form used for content-addressed work.
///
/// # Example
///
/// ```
/// use pulse_types::TraceId;
///
/// let id = TraceId::parse("sha256:9f86d081884c7d65").unwrap();
/// assert_eq!(id.algorithm(), Some("sha256"));
/// assert_eq!(id.hex(), Some("9f86d081884c7d65"));
///
/// assert!(TraceId::parse("not-a-digest").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Creates a trace id from any string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parses a digest of the form `algorithm:hex`.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidDigest`] when the separator is missing,
    /// either side is empty, the algorithm is not lowercase alphanumeric, or
    /// the encoded part is not lowercase hex.
    pub fn parse(value: impl Into<String>) -> Result<Self, TypesError> {
        let value = value.into();
        let invalid = |reason| TypesError::InvalidDigest {
            value: value.clone(),
            reason,
        };

        let (algorithm, hex) = value
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' separator"))?;
        if algorithm.is_empty() {
            return Err(invalid("empty algorithm"));
        }
        if !algorithm
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid("algorithm must be lowercase alphanumeric"));
        }
        if hex.is_empty() {
            return Err(invalid("empty encoded part"));
        }
        if !hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(invalid("encoded part must be lowercase hex"));
        }

        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the digest algorithm, if the id has digest form.
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.0.split_once(':').map(|(algorithm, _)| algorithm)
    }

    /// Returns the encoded part, if the id has digest form.
    #[must_use]
    pub fn hex(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, hex)| hex)
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TraceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of an operation that claims log output for trace ids.
///
/// Each call to [`ClaimantId::new`] produces a distinct identity, even for
/// equal labels: equality compares the random UUID, so two concurrent
/// operations that happen to share a name never share ownership.
///
/// # Example
///
/// ```
/// use pulse_types::ClaimantId;
///
/// let a = ClaimantId::new("build");
/// let b = ClaimantId::new("build");
///
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// assert_eq!(a.label(), "build");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimantId {
    uuid: Uuid,
    label: String,
}

impl ClaimantId {
    /// Creates a new identity with a random UUID v4.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            label: label.into(),
        }
    }

    /// Returns the UUID that carries this identity.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for ClaimantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.label, self.uuid)
    }
}
