//! Printer construction.

use super::reporting_loop::{CloseHook, ReportingLoop};
use super::Printer;
use crate::config::PrinterConfig;
use crate::log_gate::LogGate;
use crate::log_source::LogSourceMap;
use crate::mode::{self, ConsoleTarget, PrinterMode, PROGRESS_ENV};
use crate::render::{Description, DisplayOptions, Renderer, ShutdownSignal};
use crate::status::DEFAULT_STATUS_BUFFER;
use crate::PrinterError;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::debug;

/// Builder for [`Printer`].
///
/// # Example
///
/// ```
/// use pulse_printer::{ConsoleTarget, PlainRenderer, Printer, PrinterMode};
/// use pulse_printer::testing::SharedBuffer;
/// use pulse_types::{StatusEvent, TraceId, VertexState};
///
/// #[tokio::main]
/// async fn main() {
///     let out = SharedBuffer::new();
///     let printer = Printer::builder(PlainRenderer::new())
///         .mode(PrinterMode::Plain)
///         .sink(out.clone())
///         .console(ConsoleTarget::Detached)
///         .phase("building")
///         .skip_env()
///         .build()
///         .await
///         .unwrap();
///
///     let id = TraceId::new("sha256:01");
///     printer
///         .write(StatusEvent::vertex(id, "compile", VertexState::Started))
///         .await
///         .unwrap();
///     printer.wait().await.unwrap();
///
///     assert_eq!(out.contents(), "[+] building\n#1 compile\n");
/// }
/// ```
pub struct PrinterBuilder<R: Renderer> {
    renderer: R,
    mode: PrinterMode,
    sink: Option<Box<dyn Write + Send>>,
    console: ConsoleTarget,
    options: DisplayOptions,
    on_close: Option<CloseHook>,
    buffer: usize,
    shutdown: ShutdownSignal,
    log_gate: Option<LogGate>,
    read_env: bool,
}

impl<R: Renderer> PrinterBuilder<R> {
    /// Starts a builder with defaults: `auto` mode, stderr sink and console,
    /// no phase or description, default buffer.
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            mode: PrinterMode::Auto,
            sink: None,
            console: ConsoleTarget::default(),
            options: DisplayOptions::default(),
            on_close: None,
            buffer: DEFAULT_STATUS_BUFFER,
            shutdown: ShutdownSignal::never(),
            log_gate: None,
            read_env: true,
        }
    }

    /// Starts a builder from loaded configuration.
    #[must_use]
    pub fn from_config(renderer: R, config: &PrinterConfig) -> Self {
        let mut builder = Self::new(renderer).mode(config.mode).buffer(config.buffer);
        builder.options.phase.clone_from(&config.phase);
        builder.options.description = config.description.clone().map(Description::from);
        builder
    }

    #[must_use]
    pub fn mode(mut self, mode: PrinterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Output sink. Replaced by a discarding writer in quiet mode.
    #[must_use]
    pub fn sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Stream checked for terminal capability.
    #[must_use]
    pub fn console(mut self, target: ConsoleTarget) -> Self {
        self.console = target;
        self
    }

    #[must_use]
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.options.phase = Some(phase.into());
        self
    }

    /// Description text and its short console form.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>, console: impl Into<String>) -> Self {
        self.options.description = Some(Description {
            text: text.into(),
            console: console.into(),
        });
        self
    }

    /// Hook run after every completed cycle.
    #[must_use]
    pub fn on_close(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(hook));
        self
    }

    /// Status channel capacity per cycle.
    #[must_use]
    pub fn buffer(mut self, capacity: usize) -> Self {
        self.buffer = capacity;
        self
    }

    /// Shutdown signal consulted when a cycle starts rendering.
    #[must_use]
    pub fn shutdown(mut self, rx: watch::Receiver<bool>) -> Self {
        self.shutdown = ShutdownSignal::from_watch(rx);
        self
    }

    /// Gate paused for the duration of every cycle.
    #[must_use]
    pub fn log_gate(mut self, gate: LogGate) -> Self {
        self.log_gate = Some(gate);
        self
    }

    /// Ignore `PULSE_PROGRESS`.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Resolves the mode, spawns the reporting loop and waits for the first
    /// cycle to become ready.
    ///
    /// # Errors
    ///
    /// - [`PrinterError::Config`] if `PULSE_PROGRESS` holds an unknown mode
    /// - [`PrinterError::TerminalUnavailable`] for `tty` without a terminal
    /// - [`PrinterError::LoopExited`] if the loop died before its first cycle
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub async fn build(self) -> Result<Printer<R>, PrinterError> {
        let requested = if self.read_env {
            let value = std::env::var(PROGRESS_ENV).ok();
            self.mode.with_override(value.as_deref())?
        } else {
            self.mode
        };
        let resolved = mode::resolve(requested, self.console)?;

        let sink: Box<dyn Write + Send> = if resolved.discard {
            Box::new(std::io::sink())
        } else {
            self.sink.unwrap_or_else(|| Box::new(std::io::stderr()))
        };

        let sources = Arc::new(LogSourceMap::new());
        let reporting = ReportingLoop {
            renderer: self.renderer,
            sink,
            console: resolved.console,
            options: self.options,
            on_close: self.on_close,
            shutdown: self.shutdown,
            log_gate: self.log_gate,
            buffer: self.buffer,
            sources: Arc::clone(&sources),
            cycle: 0,
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(reporting.run(ready_tx));
        let first = ready_rx.await.map_err(|_| PrinterError::LoopExited)?;

        debug!(
            mode = %resolved.mode,
            console = resolved.console.is_some(),
            "Printer started"
        );
        Ok(Printer::start(first, resolved.mode, sources))
    }
}

impl<R: Renderer> std::fmt::Debug for PrinterBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterBuilder")
            .field("mode", &self.mode)
            .field("console", &self.console)
            .field("options", &self.options)
            .field("buffer", &self.buffer)
            .field("read_env", &self.read_env)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DescriptionConfig;
    use crate::testing::RecordingRenderer;

    #[tokio::test]
    async fn from_config_carries_display_options() {
        let config = PrinterConfig {
            mode: PrinterMode::Plain,
            phase: Some("testing".into()),
            description: Some(DescriptionConfig {
                text: "Testing 4 packages".into(),
                console: "test".into(),
            }),
            buffer: 4,
            hold_logs: false,
        };
        let renderer = RecordingRenderer::<u8>::new();
        let cycles = renderer.cycles();

        let builder = PrinterBuilder::from_config(renderer, &config);
        assert_eq!(builder.buffer, 4);
        let printer = builder
            .console(ConsoleTarget::Detached)
            .skip_env()
            .build()
            .await
            .expect("build");
        assert_eq!(printer.mode(), PrinterMode::Plain);
        printer.wait().await.expect("wait");

        let records = cycles.records();
        assert_eq!(records[0].options.phase.as_deref(), Some("testing"));
        assert_eq!(
            records[0].options.description.as_ref().map(|d| d.text.as_str()),
            Some("Testing 4 packages")
        );
        assert!(!records[0].had_console);
    }

    #[tokio::test]
    async fn explicit_mode_ignores_env() {
        // A non-auto mode is never overridden, so this holds whatever the
        // environment contains.
        let printer = Printer::builder(RecordingRenderer::<u8>::new())
            .mode(PrinterMode::Plain)
            .console(ConsoleTarget::Detached)
            .build()
            .await
            .expect("build");
        assert_eq!(printer.mode(), PrinterMode::Plain);
        printer.wait().await.expect("wait");
    }
}
