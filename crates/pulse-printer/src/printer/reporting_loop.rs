//! Background task driving reporting cycles.
//!
//! ```text
//! Starting ──► Running ──► Draining ──┬──► Terminating
//!    ▲                                │
//!    └──────── WaitingToResume ◄──────┘ (Pause)
//! ```
//!
//! Every cycle allocates its own status channel and its own readiness,
//! completion and directive signals, so a signal from an earlier cycle can
//! never be observed by a later one.

use super::{CycleHandle, Directive, ReadySender};
use crate::log_gate::LogGate;
use crate::log_source::LogSourceMap;
use crate::mode::Console;
use crate::render::{DisplayOptions, RenderContext, Renderer, ShutdownSignal};
use crate::status;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Callback run after every completed cycle.
pub type CloseHook = Arc<dyn Fn() + Send + Sync>;

/// Owns the renderer and the sink for the printer's lifetime.
///
/// Created by [`PrinterBuilder::build`](super::PrinterBuilder::build) and
/// spawned onto the tokio runtime; not constructed directly.
pub struct ReportingLoop<R: Renderer> {
    pub(super) renderer: R,
    pub(super) sink: Box<dyn Write + Send>,
    pub(super) console: Option<Console>,
    pub(super) options: DisplayOptions,
    pub(super) on_close: Option<CloseHook>,
    pub(super) shutdown: ShutdownSignal,
    pub(super) log_gate: Option<LogGate>,
    pub(super) buffer: usize,
    pub(super) sources: Arc<LogSourceMap>,
    pub(super) cycle: u64,
}

impl<R: Renderer> ReportingLoop<R> {
    /// Runs cycles until the controller terminates or disappears.
    pub(super) async fn run(mut self, ready: ReadySender<R::Event, R::Warning>) {
        let mut ready = ready;
        loop {
            self.cycle += 1;
            let cycle = self.cycle;

            let (status, events) = status::channel(self.buffer);
            let (done_tx, done_rx) = oneshot::channel();
            let (next_tx, next_rx) = oneshot::channel();
            self.sources.reset();

            let handle = CycleHandle {
                number: cycle,
                status,
                done: done_rx,
                next: next_tx,
            };
            // Logs are held from the moment producers may write.
            let held = self.log_gate.as_ref().map(LogGate::pause);
            if ready.send(handle).is_err() {
                warn!(cycle, "Printer dropped before the cycle became ready");
                return;
            }
            debug!(cycle, "Reporting cycle started");

            let outcome = {
                let _held = held;
                let ctx = RenderContext {
                    sink: self.sink.as_mut(),
                    console: self.console,
                    cycle,
                    shutdown: self.shutdown.clone(),
                };
                self.renderer.render(ctx, events, &self.options).await
            };

            debug!(
                cycle,
                warnings = outcome.warnings.len(),
                failed = outcome.error.is_some(),
                "Reporting cycle drained"
            );
            if done_tx.send(outcome).is_err() {
                warn!(cycle, "Printer dropped while the cycle was draining");
            }

            if let Some(hook) = &self.on_close {
                hook();
            }

            match next_rx.await {
                Ok(Directive::Pause(resume)) => {
                    debug!(cycle, "Reporting loop paused");
                    match resume.await {
                        Ok(next_ready) => ready = next_ready,
                        Err(_) => {
                            debug!(cycle, "Printer dropped while paused");
                            return;
                        }
                    }
                }
                Ok(Directive::Terminate) => {
                    debug!(cycle, "Reporting loop terminated");
                    return;
                }
                Err(_) => {
                    debug!(cycle, "Printer dropped, reporting loop exiting");
                    return;
                }
            }
        }
    }
}
