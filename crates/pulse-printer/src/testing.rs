//! Test doubles for printer users.
//!
//! - [`RecordingRenderer`]: records every event it observes, per cycle,
//!   and returns scripted warnings and errors.
//! - [`SharedBuffer`]: cloneable in-memory writer for sinks and log gates.
//!
//! # Example
//!
//! ```
//! use pulse_printer::testing::RecordingRenderer;
//! use pulse_printer::{ConsoleTarget, Printer, PrinterMode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let renderer = RecordingRenderer::<u32>::new();
//!     let cycles = renderer.cycles();
//!     renderer.fail_next("renderer gave up");
//!
//!     let printer = Printer::builder(renderer)
//!         .mode(PrinterMode::Plain)
//!         .console(ConsoleTarget::Detached)
//!         .skip_env()
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     printer.write(7).await.unwrap();
//!     let err = printer.wait().await.unwrap_err();
//!
//!     assert_eq!(err.to_string(), "renderer gave up");
//!     assert_eq!(cycles.events(1), vec![7]);
//! }
//! ```

use crate::render::{DisplayOptions, RenderContext, RenderOutcome, Renderer};
use crate::status::StatusReceiver;
use crate::RenderError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;

/// Cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// What one recorded cycle looked like.
#[derive(Debug, Clone)]
pub struct CycleRecord<E> {
    /// Cycle number as reported by the loop.
    pub cycle: u64,
    /// Events in the order observed.
    pub events: Vec<E>,
    /// Display options handed to the renderer.
    pub options: DisplayOptions,
    /// Whether a console was handed to the renderer.
    pub had_console: bool,
}

/// Shared view of every cycle a [`RecordingRenderer`] has completed.
#[derive(Debug)]
pub struct CycleLog<E> {
    records: Arc<Mutex<Vec<CycleRecord<E>>>>,
}

impl<E> Clone for CycleLog<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E: Clone> CycleLog<E> {
    /// Completed cycle records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<CycleRecord<E>> {
        self.records.lock().clone()
    }

    /// Events observed in cycle `cycle` (1-based); empty if unknown.
    #[must_use]
    pub fn events(&self, cycle: u64) -> Vec<E> {
        self.records
            .lock()
            .iter()
            .find(|r| r.cycle == cycle)
            .map(|r| r.events.clone())
            .unwrap_or_default()
    }

    /// Number of completed cycles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[derive(Debug, Default)]
struct Script {
    warnings: Vec<String>,
    error: Option<String>,
}

/// Renderer that records events and replays scripted outcomes.
///
/// Each observed event is also written to the sink as one `Debug` line, so
/// tests can tell whether output reached or bypassed the sink.
#[derive(Debug)]
pub struct RecordingRenderer<E> {
    log: CycleLog<E>,
    script: Mutex<VecDeque<Script>>,
}

impl<E> RecordingRenderer<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: CycleLog {
                records: Arc::new(Mutex::new(Vec::new())),
            },
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Handle on the recorded cycles; stays valid after the renderer moves
    /// into a printer.
    #[must_use]
    pub fn cycles(&self) -> CycleLog<E> {
        self.log.clone()
    }

    /// Scripts the next unscripted cycle to end with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.script.lock().push_back(Script {
            warnings: Vec::new(),
            error: Some(message.into()),
        });
    }

    /// Scripts the next unscripted cycle to succeed with `warnings`.
    pub fn warn_next(&self, warnings: Vec<String>) {
        self.script.lock().push_back(Script {
            warnings,
            error: None,
        });
    }

    /// Scripts the next unscripted cycle to succeed without warnings.
    pub fn succeed_next(&self) {
        self.script.lock().push_back(Script::default());
    }
}

impl<E> Default for RecordingRenderer<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> Renderer for RecordingRenderer<E>
where
    E: Clone + std::fmt::Debug + Send + Sync + 'static,
{
    type Event = E;
    type Warning = String;

    async fn render(
        &self,
        ctx: RenderContext<'_>,
        mut events: StatusReceiver<E>,
        options: &DisplayOptions,
    ) -> RenderOutcome<String> {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            let _ = writeln!(ctx.sink, "{event:?}");
            seen.push(event);
        }

        self.log.records.lock().push(CycleRecord {
            cycle: ctx.cycle,
            events: seen,
            options: options.clone(),
            had_console: ctx.console.is_some(),
        });

        let script = self.script.lock().pop_front().unwrap_or_default();
        match script.error {
            Some(message) => RenderOutcome::failed(script.warnings, RenderError::Failed(message)),
            None => RenderOutcome::ok(script.warnings),
        }
    }
}
