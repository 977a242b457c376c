//! Shared types for the pulse progress printer.
//!
//! - [`TraceId`] / [`ClaimantId`]: identities used for log-source arbitration
//! - [`StatusEvent`] and friends: the status event model spoken by the
//!   bundled renderer and the CLI
//! - [`ErrorCode`]: machine-readable codes implemented by every error enum

mod error;
mod id;
mod status;

pub use error::{assert_error_code, assert_error_codes, ErrorCode, TypesError};
pub use id::{ClaimantId, TraceId};
pub use status::{LogStream, StatusEvent, VertexState, VertexWarning};
