//! Printer configuration.
//!
//! [`PrinterConfig`] gathers the construction-time settings of a printer:
//! display mode, phase label, description, channel capacity and whether
//! process logs are held while progress renders. [`ConfigLoader`] layers
//! defaults, an optional TOML file and environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Effect | Applied by |
//! |----------|--------|------------|
//! | `PULSE_PROGRESS` | replaces an `auto` mode | `PrinterBuilder::build` |
//! | `PULSE_PROGRESS_BUFFER` | `buffer` | [`ConfigLoader::load`] |

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{ConfigLoader, BUFFER_ENV};
pub use types::{DescriptionConfig, PrinterConfig};
