//! Renderer contract.
//!
//! A [`Renderer`] turns one cycle's stream of status events into output.
//! The reporting loop calls [`Renderer::render`] exactly once per cycle and
//! hands it the receiving end of that cycle's status channel; the renderer
//! must keep consuming until the stream closes, then report its warnings and
//! terminal error as a [`RenderOutcome`].
//!
//! [`PlainRenderer`] is the bundled line-oriented implementation.

mod plain;

pub use plain::PlainRenderer;

use crate::config::DescriptionConfig;
use crate::mode::Console;
use crate::status::StatusReceiver;
use crate::RenderError;
use async_trait::async_trait;
use std::io::Write;
use tokio::sync::watch;

/// Consumer of one reporting cycle.
#[async_trait]
pub trait Renderer: Send + Sync + 'static {
    /// Status event type accepted by this renderer.
    type Event: Send + 'static;
    /// Warning type collected by this renderer.
    type Warning: Clone + Send + Sync + 'static;

    /// Renders `events` until the stream closes.
    ///
    /// Only the start of rendering is bound to `ctx.shutdown`: a renderer
    /// that has started keeps draining and reporting until its input is
    /// closed, so final errors and warnings are not truncated.
    async fn render(
        &self,
        ctx: RenderContext<'_>,
        events: StatusReceiver<Self::Event>,
        options: &DisplayOptions,
    ) -> RenderOutcome<Self::Warning>;
}

/// Per-cycle resources handed to a renderer.
pub struct RenderContext<'a> {
    /// Output sink (discarding in quiet mode).
    pub sink: &'a mut (dyn Write + Send),
    /// Detected terminal, if any.
    pub console: Option<Console>,
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Governing shutdown signal.
    pub shutdown: ShutdownSignal,
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("console", &self.console)
            .field("cycle", &self.cycle)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

/// Result of one cycle.
#[derive(Debug)]
pub struct RenderOutcome<W> {
    /// Warnings collected during the cycle.
    pub warnings: Vec<W>,
    /// Terminal error, `None` on a clean run.
    pub error: Option<RenderError>,
}

impl<W> RenderOutcome<W> {
    /// A clean run.
    #[must_use]
    pub fn ok(warnings: Vec<W>) -> Self {
        Self {
            warnings,
            error: None,
        }
    }

    /// A run that ended with `error`.
    #[must_use]
    pub fn failed(warnings: Vec<W>, error: RenderError) -> Self {
        Self {
            warnings,
            error: Some(error),
        }
    }
}

/// Display configuration passed unmodified to the renderer every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Phase label, e.g. `"building"`.
    pub phase: Option<String>,
    /// Description of the run.
    pub description: Option<Description>,
}

/// Description of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Full text.
    pub text: String,
    /// Short form for a console title.
    pub console: String,
}

impl From<DescriptionConfig> for Description {
    fn from(config: DescriptionConfig) -> Self {
        Self {
            text: config.text,
            console: config.console,
        }
    }
}

/// Governing cancellation for the start of rendering.
///
/// Wraps a `watch` channel whose value turns `true` on shutdown. A signal
/// without a channel never fires.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Follows `rx`; shutdown is requested once it holds `true`.
    #[must_use]
    pub fn from_watch(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Returns `true` if shutdown was requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }
}
