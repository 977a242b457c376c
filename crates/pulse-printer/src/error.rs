//! Printer and renderer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`PrinterError::TerminalUnavailable`] | `PRINTER_TERMINAL_UNAVAILABLE` | No |
//! | [`PrinterError::Render`] | `PRINTER_RENDER_FAILED` | Depends on cause |
//! | [`PrinterError::NotWritable`] | `PRINTER_NOT_WRITABLE` | No |
//! | [`PrinterError::NotPaused`] | `PRINTER_NOT_PAUSED` | No |
//! | [`PrinterError::StatusClosed`] | `PRINTER_STATUS_CLOSED` | No |
//! | [`PrinterError::LoopExited`] | `PRINTER_LOOP_EXITED` | No |
//! | [`PrinterError::Config`] | `PRINTER_CONFIG` | Yes |
//!
//! `NotWritable` and `NotPaused` report contract violations (writing after
//! `wait`, waiting twice, unpausing a running printer). They are returned
//! instead of panicking, but callers should treat them as bugs.

use crate::config::ConfigError;
use pulse_types::ErrorCode;
use thiserror::Error;

/// Error produced by a [`Renderer`](crate::Renderer) for one cycle.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output sink failed.
    #[error("failed to write progress output: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering was cancelled before it started.
    #[error("progress display cancelled")]
    Cancelled,

    /// Renderer-specific failure.
    #[error("{0}")]
    Failed(String),
}

impl RenderError {
    /// Creates a renderer-specific failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Printer controller error.
#[derive(Debug, Error)]
pub enum PrinterError {
    /// A TTY display was forced but the console is not a terminal.
    #[error("failed to get console: {source}")]
    TerminalUnavailable {
        #[source]
        source: std::io::Error,
    },

    /// The renderer reported an error for the cycle that just drained.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// No cycle is active: `write`/`wait` after `wait` or `pause`.
    #[error("printer is not accepting status events (no active reporting cycle)")]
    NotWritable,

    /// `unpause` called while the printer is not paused.
    #[error("printer is not paused")]
    NotPaused,

    /// The renderer stopped consuming before the stream was closed.
    #[error("status channel closed by the renderer")]
    StatusClosed,

    /// The reporting loop is gone (renderer panicked or runtime shut down).
    #[error("reporting loop exited unexpectedly")]
    LoopExited,

    /// Invalid printer configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ErrorCode for PrinterError {
    fn code(&self) -> &'static str {
        match self {
            Self::TerminalUnavailable { .. } => "PRINTER_TERMINAL_UNAVAILABLE",
            Self::Render(_) => "PRINTER_RENDER_FAILED",
            Self::NotWritable => "PRINTER_NOT_WRITABLE",
            Self::NotPaused => "PRINTER_NOT_PAUSED",
            Self::StatusClosed => "PRINTER_STATUS_CLOSED",
            Self::LoopExited => "PRINTER_LOOP_EXITED",
            Self::Config(_) => "PRINTER_CONFIG",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Render(RenderError::Io(_)) | Self::Config(_))
    }
}
