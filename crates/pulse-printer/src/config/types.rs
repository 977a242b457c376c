//! Configuration types.

use super::ConfigError;
use crate::mode::PrinterMode;
use crate::status::DEFAULT_STATUS_BUFFER;
use serde::{Deserialize, Serialize};

/// Printer configuration.
///
/// ```toml
/// mode = "auto"          # auto | tty | plain | quiet
/// phase = "building"
/// buffer = 16            # status events buffered before write() waits
/// hold_logs = true       # hold log output while progress renders
///
/// [description]
/// text = "Building 3 targets"
/// console = "building"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Requested display mode (before the `PULSE_PROGRESS` override).
    pub mode: PrinterMode,
    /// Phase label shown by the renderer.
    pub phase: Option<String>,
    /// Description shown by the renderer.
    pub description: Option<DescriptionConfig>,
    /// Status channel capacity.
    pub buffer: usize,
    /// Hold process log output while a cycle renders.
    pub hold_logs: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            mode: PrinterMode::Auto,
            phase: None,
            description: None,
            buffer: DEFAULT_STATUS_BUFFER,
            hold_logs: true,
        }
    }
}

impl PrinterConfig {
    /// Overlays every field set in `other` onto `self`.
    ///
    /// `mode`, `buffer` and `hold_logs` are taken from `other` when they
    /// differ from their defaults.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();
        if other.mode != defaults.mode {
            self.mode = other.mode;
        }
        if other.phase.is_some() {
            self.phase.clone_from(&other.phase);
        }
        if other.description.is_some() {
            self.description.clone_from(&other.description);
        }
        if other.buffer != defaults.buffer {
            self.buffer = other.buffer;
        }
        if other.hold_logs != defaults.hold_logs {
            self.hold_logs = other.hold_logs;
        }
    }

    /// Checks field domains.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `buffer` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer == 0 {
            return Err(ConfigError::invalid_value("buffer", "must be at least 1"));
        }
        Ok(())
    }
}

/// Text describing the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionConfig {
    /// Full description.
    pub text: String,
    /// Short form for the console title.
    #[serde(default)]
    pub console: String,
}
