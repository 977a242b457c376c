//! Configuration loader.
//!
//! # Load Order
//!
//! 1. Default values
//! 2. Config file (`with_file`), if it exists
//! 3. Environment variables (`PULSE_PROGRESS_BUFFER`)
//!
//! Each layer overrides the previous. `PULSE_PROGRESS` is not a loader layer:
//! it only replaces an `auto` mode and is applied when the printer is built.

use super::{ConfigError, PrinterConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding [`PrinterConfig::buffer`].
pub const BUFFER_ENV: &str = "PULSE_PROGRESS_BUFFER";

/// Configuration loader with builder pattern.
///
/// ```ignore
/// use pulse_printer::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_file("pulse.toml")
///     .skip_env_vars()
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TOML file to layer over the defaults.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, an environment variable is malformed, or the merged result
    /// fails [`PrinterConfig::validate`]. A missing file is ignored.
    pub fn load(&self) -> Result<PrinterConfig, ConfigError> {
        let mut config = PrinterConfig::default();

        if let Some(ref path) = self.file {
            if let Some(file_config) = load_file(path)? {
                debug!(path = %path.display(), "Loaded printer config");
                config.merge(&file_config);
            }
        }

        if !self.skip_env {
            apply_env_vars(&mut config, |name| std::env::var(name).ok())?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<Option<PrinterConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config = toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
    Ok(Some(config))
}

fn apply_env_vars(
    config: &mut PrinterConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(BUFFER_ENV) {
        config.buffer = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid_env_var(BUFFER_ENV, "expected a positive integer"))?;
    }
    Ok(())
}
