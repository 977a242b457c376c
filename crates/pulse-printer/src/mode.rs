//! Display mode selection.
//!
//! | Mode | Sink | Console |
//! |------|------|---------|
//! | `quiet` | discarded | none |
//! | `auto` | as given | detected; falls back to plain |
//! | `tty` | as given | detected; construction fails without one |
//! | `plain` | as given | none |
//!
//! `PULSE_PROGRESS` replaces an `auto` request before it is evaluated. It is
//! read once, when the printer is built.

use crate::config::ConfigError;
use crate::PrinterError;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::str::FromStr;
use tracing::debug;

/// Environment variable that overrides [`PrinterMode::Auto`].
pub const PROGRESS_ENV: &str = "PULSE_PROGRESS";

/// Progress display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterMode {
    /// Rich display when a terminal is available, plain otherwise.
    #[default]
    Auto,
    /// Rich display; fail if no terminal is available.
    Tty,
    /// Line-oriented output.
    Plain,
    /// Discard all output.
    Quiet,
}

impl PrinterMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Tty => "tty",
            Self::Plain => "plain",
            Self::Quiet => "quiet",
        }
    }

    /// Applies the environment override.
    ///
    /// Only an `Auto` request is replaced, and only by a non-empty value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if the override is not a mode.
    ///
    /// ```
    /// use pulse_printer::PrinterMode;
    ///
    /// assert_eq!(PrinterMode::Auto.with_override(Some("plain")).unwrap(), PrinterMode::Plain);
    /// assert_eq!(PrinterMode::Tty.with_override(Some("plain")).unwrap(), PrinterMode::Tty);
    /// assert_eq!(PrinterMode::Auto.with_override(Some("")).unwrap(), PrinterMode::Auto);
    /// ```
    pub fn with_override(self, env_value: Option<&str>) -> Result<Self, ConfigError> {
        match (self, env_value) {
            (Self::Auto, Some(value)) if !value.trim().is_empty() => value
                .parse::<Self>()
                .map_err(|e| ConfigError::invalid_env_var(PROGRESS_ENV, e.to_string())),
            (mode, _) => Ok(mode),
        }
    }
}

impl std::fmt::Display for PrinterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrinterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "tty" => Ok(Self::Tty),
            "plain" => Ok(Self::Plain),
            "quiet" => Ok(Self::Quiet),
            other => Err(ConfigError::invalid_value(
                "mode",
                format!("unknown progress mode '{other}' (expected auto, tty, plain or quiet)"),
            )),
        }
    }
}

/// Stream checked for terminal capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    Stdout,
    #[default]
    Stderr,
    /// Never a terminal. Useful for tests and for pipes known in advance.
    Detached,
}

impl ConsoleTarget {
    fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => std::io::stdout().is_terminal(),
            Self::Stderr => std::io::stderr().is_terminal(),
            Self::Detached => false,
        }
    }
}

/// Handle to a detected terminal, handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Console {
    target: ConsoleTarget,
}

impl Console {
    /// Detects a terminal on `target`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `target` is not a terminal.
    pub fn detect(target: ConsoleTarget) -> std::io::Result<Self> {
        if target.is_terminal() {
            Ok(Self { target })
        } else {
            Err(std::io::Error::other(format!(
                "{target:?} is not a terminal"
            )))
        }
    }

    #[must_use]
    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

/// Outcome of mode evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Mode after the environment override.
    pub mode: PrinterMode,
    /// Detected console, if the mode wants one and one exists.
    pub console: Option<Console>,
    /// Whether output must be discarded.
    pub discard: bool,
}

/// Evaluates `mode` against `target`.
///
/// # Errors
///
/// Returns [`PrinterError::TerminalUnavailable`] for [`PrinterMode::Tty`]
/// when `target` is not a terminal.
pub fn resolve(mode: PrinterMode, target: ConsoleTarget) -> Result<Resolved, PrinterError> {
    let resolved = match mode {
        PrinterMode::Quiet => Resolved {
            mode,
            console: None,
            discard: true,
        },
        PrinterMode::Plain => Resolved {
            mode,
            console: None,
            discard: false,
        },
        PrinterMode::Auto => {
            let console = match Console::detect(target) {
                Ok(console) => Some(console),
                Err(e) => {
                    debug!(error = %e, "No console detected, using plain progress output");
                    None
                }
            };
            Resolved {
                mode,
                console,
                discard: false,
            }
        }
        PrinterMode::Tty => {
            let console = Console::detect(target)
                .map_err(|source| PrinterError::TerminalUnavailable { source })?;
            Resolved {
                mode,
                console: Some(console),
                discard: false,
            }
        }
    };
    Ok(resolved)
}
