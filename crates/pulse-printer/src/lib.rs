//! Pausable progress printer.
//!
//! # Overview
//!
//! A [`Printer`] runs a background reporting loop that feeds status events
//! to a [`Renderer`], one *cycle* at a time:
//!
//! ```text
//!   producers                 Printer (controller)          ReportingLoop (task)
//!  ──────────                ─────────────────────         ──────────────────────
//!  write(e) ───────────────► status channel (cycle n) ───► Renderer::render
//!  wait()/pause() ─────────► close channel, await done ◄── RenderOutcome
//!  unpause() ──────────────► resume signal ──────────────► cycle n+1 ready
//! ```
//!
//! Between cycles, concurrent producers that share units of work arbitrate
//! who may attribute log lines to each [`TraceId`](pulse_types::TraceId)
//! through the printer's [`LogSourceMap`]; every claim is forgotten when the
//! next cycle starts.
//!
//! # Modules
//!
//! - [`printer`]: controller, builder, reporting loop, producer handles
//! - [`status`]: bounded per-cycle status channel
//! - [`render`]: renderer contract and the bundled [`PlainRenderer`]
//! - [`mode`]: display mode selection and console detection
//! - [`config`]: TOML/env configuration
//! - [`log_gate`]: holds process logging while a cycle renders
//! - [`testing`]: test doubles
//!
//! # Example
//!
//! ```
//! use pulse_printer::{ConsoleTarget, PlainRenderer, Printer, PrinterMode};
//! use pulse_printer::testing::SharedBuffer;
//! use pulse_types::{StatusEvent, TraceId, VertexState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pulse_printer::PrinterError> {
//!     let out = SharedBuffer::new();
//!     let printer = Arc::new(
//!         Printer::builder(PlainRenderer::new())
//!             .mode(PrinterMode::Plain)
//!             .sink(out.clone())
//!             .console(ConsoleTarget::Detached)
//!             .skip_env()
//!             .build()
//!             .await?,
//!     );
//!
//!     let id = TraceId::new("sha256:aa");
//!     let job = printer.operation("job-1");
//!     job.write(StatusEvent::vertex(id.clone(), "fetch", VertexState::Started)).await?;
//!     job.write_log(&id, StatusEvent::stdout(id.clone(), "downloading")).await?;
//!     job.finish();
//!
//!     printer.wait().await?;
//!     assert_eq!(out.contents(), "#1 fetch\n#1 downloading\n");
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod log_gate;
mod log_source;
pub mod mode;
pub mod printer;
pub mod render;
pub mod status;
pub mod testing;

pub use config::{ConfigError, ConfigLoader, PrinterConfig};
pub use error::{PrinterError, RenderError};
pub use log_gate::{GateResult, LogGate, LogGateGuard};
pub use log_source::{Claim, LogSourceMap};
pub use mode::{Console, ConsoleTarget, PrinterMode};
pub use printer::{Operation, Printer, PrinterBuilder};
pub use render::{
    Description, DisplayOptions, PlainRenderer, RenderContext, RenderOutcome, Renderer,
    ShutdownSignal,
};
