//! Unified error interface for pulse crates.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so callers can
//! branch on a stable machine-readable code instead of display strings.
//!
//! # Example
//!
//! ```
//! use pulse_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum SinkError {
//!     Closed,
//!     Full,
//! }
//!
//! impl ErrorCode for SinkError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Closed => "SINK_CLOSED",
//!             Self::Full => "SINK_FULL",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Full)
//!     }
//! }
//!
//! assert_eq!(SinkError::Full.code(), "SINK_FULL");
//! assert!(SinkError::Full.is_recoverable());
//! ```

use thiserror::Error;

/// Machine-readable error code interface.
///
/// Codes are UPPER_SNAKE_CASE, prefixed with the owning domain
/// (`PRINTER_`, `CONFIG_`, `TYPES_`) and stable across versions.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying or user action may clear the error.
    fn is_recoverable(&self) -> bool;
}

/// Errors raised while constructing pulse value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// A trace id did not have the `algorithm:hex` digest form.
    #[error("invalid digest '{value}': {reason}")]
    InvalidDigest { value: String, reason: &'static str },
}

impl ErrorCode for TypesError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidDigest { .. } => "TYPES_INVALID_DIGEST",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Validates that an error code follows workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE. Intended for tests.
///
/// ```
/// use pulse_types::{assert_error_code, TypesError};
///
/// let err = TypesError::InvalidDigest { value: "x".into(), reason: "missing ':'" };
/// assert_error_code(&err, "TYPES_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();
    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every error in `errors` with [`assert_error_code`].
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
