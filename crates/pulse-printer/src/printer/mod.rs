//! Printer controller.
//!
//! A [`Printer`] fronts a background [`ReportingLoop`]. Producers push status
//! events with [`Printer::write`]; the loop hands them to the renderer for
//! the current cycle. A cycle ends with [`Printer::wait`] (final) or
//! [`Printer::pause`] (the loop waits for [`Printer::unpause`] and starts a
//! fresh cycle).
//!
//! ```text
//!           write()                        wait()
//! Active ───────────► Active    Active ───────────► Draining ──► Closed
//!
//!           pause()                        unpause()
//! Active ───────────► Draining ──► Paused ─────────► Resuming ──► Active
//! ```
//!
//! All methods take `&self`; share the printer with `Arc`. Controller state
//! lives behind a `parking_lot::Mutex` that is never held across an await.
//! A pending drain or resume stays in that state, so a `wait`, `pause` or
//! `unpause` future dropped early can be retried.

mod builder;
mod operation;
mod reporting_loop;

pub use builder::PrinterBuilder;
pub use operation::Operation;
pub use reporting_loop::{CloseHook, ReportingLoop};

use crate::log_source::LogSourceMap;
use crate::mode::PrinterMode;
use crate::render::{RenderOutcome, Renderer};
use crate::status::StatusSender;
use crate::PrinterError;
use parking_lot::Mutex;
use pulse_types::{ClaimantId, TraceId};
use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::Poll;
use tokio::sync::oneshot;
use tracing::debug;

/// Readiness signal: fired once per cycle with that cycle's handle.
type ReadySender<E, W> = oneshot::Sender<CycleHandle<E, W>>;

/// What the loop does after the current cycle completes.
enum Directive<E, W> {
    Terminate,
    /// Wait for the resume signal, which carries the next readiness sender.
    Pause(oneshot::Receiver<ReadySender<E, W>>),
}

/// Signals belonging to one cycle, delivered by the loop on readiness.
struct CycleHandle<E, W> {
    number: u64,
    status: StatusSender<E>,
    done: oneshot::Receiver<RenderOutcome<W>>,
    next: oneshot::Sender<Directive<E, W>>,
}

struct ActiveCycle<E, W> {
    status: StatusSender<E>,
    done: oneshot::Receiver<RenderOutcome<W>>,
    next: oneshot::Sender<Directive<E, W>>,
}

/// Completion of a cycle that `wait` or `pause` has closed.
struct Drain<E, W> {
    done: oneshot::Receiver<RenderOutcome<W>>,
    after: AfterDrain<E, W>,
    /// A call is currently awaiting `done`.
    waiting: bool,
}

/// Phase entered once a drain completes.
enum AfterDrain<E, W> {
    Close,
    Pause(oneshot::Sender<ReadySender<E, W>>),
}

impl<E, W> AfterDrain<E, W> {
    fn into_phase(self) -> Phase<E, W> {
        match self {
            Self::Close => Phase::Closed,
            Self::Pause(resume) => Phase::Paused(resume),
        }
    }
}

enum Phase<E, W> {
    Active(ActiveCycle<E, W>),
    /// `wait`/`pause` in progress, or interrupted before completion.
    Draining(Drain<E, W>),
    Paused(oneshot::Sender<ReadySender<E, W>>),
    /// `unpause` in progress, or interrupted before readiness.
    Resuming {
        ready: oneshot::Receiver<CycleHandle<E, W>>,
        waiting: bool,
    },
    /// Terminated, or the loop is gone.
    Closed,
}

impl<E, W> Phase<E, W> {
    fn name(&self) -> &'static str {
        match self {
            Self::Active(_) => "active",
            Self::Draining(_) => "draining",
            Self::Paused(_) => "paused",
            Self::Resuming { .. } => "resuming",
            Self::Closed => "closed",
        }
    }
}

/// Clears the waiting flag if the awaiting future is dropped early, so a
/// repeated call can pick up the pending signal.
struct WaiterGuard<'a, E, W> {
    phase: &'a Mutex<Phase<E, W>>,
}

impl<E, W> Drop for WaiterGuard<'_, E, W> {
    fn drop(&mut self) {
        match &mut *self.phase.lock() {
            Phase::Draining(drain) => drain.waiting = false,
            Phase::Resuming { waiting, .. } => *waiting = false,
            _ => {}
        }
    }
}

/// Pausable progress printer.
pub struct Printer<R: Renderer> {
    phase: Mutex<Phase<R::Event, R::Warning>>,
    warnings: Mutex<Vec<R::Warning>>,
    sources: Arc<LogSourceMap>,
    cycle: AtomicU64,
    mode: PrinterMode,
}

impl<R: Renderer> Printer<R> {
    /// Starts building a printer around `renderer`.
    #[must_use]
    pub fn builder(renderer: R) -> PrinterBuilder<R> {
        PrinterBuilder::new(renderer)
    }

    fn start(
        first: CycleHandle<R::Event, R::Warning>,
        mode: PrinterMode,
        sources: Arc<LogSourceMap>,
    ) -> Self {
        let printer = Self {
            phase: Mutex::new(Phase::Closed),
            warnings: Mutex::new(Vec::new()),
            sources,
            cycle: AtomicU64::new(0),
            mode,
        };
        printer.activate(first);
        printer
    }

    fn activate(&self, handle: CycleHandle<R::Event, R::Warning>) {
        self.cycle.store(handle.number, Ordering::Release);
        *self.phase.lock() = Phase::Active(ActiveCycle {
            status: handle.status,
            done: handle.done,
            next: handle.next,
        });
    }

    /// Sends `event` to the current cycle, waiting while its buffer is full.
    ///
    /// # Errors
    ///
    /// - [`PrinterError::NotWritable`] if no cycle is active (after `wait`
    ///   or `pause`, before `unpause`)
    /// - [`PrinterError::StatusClosed`] if the renderer stopped consuming
    pub async fn write(&self, event: R::Event) -> Result<(), PrinterError> {
        let status = {
            let phase = self.phase.lock();
            match &*phase {
                Phase::Active(active) => active.status.clone(),
                _ => return Err(PrinterError::NotWritable),
            }
        };
        status.send(event).await
    }

    /// Closes the current cycle and waits for the renderer to drain it.
    ///
    /// The loop terminates afterwards; the printer cannot be resumed.
    ///
    /// # Cancel safety
    ///
    /// Dropping the future before it resolves leaves the cycle closed and
    /// draining. The next `wait` or `pause` call awaits that same drain and
    /// reports its outcome; the interrupted call's directive still applies.
    ///
    /// # Errors
    ///
    /// - [`PrinterError::Render`] with the renderer's error, verbatim
    /// - [`PrinterError::NotWritable`] if no cycle is active
    /// - [`PrinterError::LoopExited`] if the loop died
    pub async fn wait(&self) -> Result<(), PrinterError> {
        self.finish_cycle(Directive::Terminate, AfterDrain::Close).await
    }

    /// Like [`wait`](Self::wait), but the loop waits for
    /// [`unpause`](Self::unpause) instead of terminating.
    ///
    /// # Cancel safety
    ///
    /// Same as [`wait`](Self::wait).
    ///
    /// # Errors
    ///
    /// Same as [`wait`](Self::wait).
    pub async fn pause(&self) -> Result<(), PrinterError> {
        let (resume_tx, resume_rx) = oneshot::channel();
        self.finish_cycle(Directive::Pause(resume_rx), AfterDrain::Pause(resume_tx))
            .await
    }

    /// Starts the next cycle after a [`pause`](Self::pause).
    ///
    /// Returns once the new cycle is ready; `write` is safe immediately
    /// afterwards.
    ///
    /// # Cancel safety
    ///
    /// Dropping the future before it resolves leaves the resume signal
    /// sent. The next `unpause` call awaits that same readiness.
    ///
    /// # Errors
    ///
    /// - [`PrinterError::NotPaused`] if the printer is not paused
    /// - [`PrinterError::LoopExited`] if the loop died
    pub async fn unpause(&self) -> Result<(), PrinterError> {
        {
            let mut phase = self.phase.lock();
            let resuming = match std::mem::replace(&mut *phase, Phase::Closed) {
                Phase::Paused(resume) => {
                    let (ready_tx, ready_rx) = oneshot::channel();
                    if resume.send(ready_tx).is_err() {
                        return Err(PrinterError::LoopExited);
                    }
                    Phase::Resuming {
                        ready: ready_rx,
                        waiting: true,
                    }
                }
                Phase::Resuming {
                    ready,
                    waiting: false,
                } => {
                    debug!("Awaiting an interrupted resume");
                    Phase::Resuming {
                        ready,
                        waiting: true,
                    }
                }
                other => {
                    *phase = other;
                    return Err(PrinterError::NotPaused);
                }
            };
            *phase = resuming;
        }

        let _waiter = WaiterGuard { phase: &self.phase };
        let received = poll_fn(|cx| match &mut *self.phase.lock() {
            Phase::Resuming { ready, .. } => Pin::new(ready).poll(cx).map(Some),
            _ => Poll::Ready(None),
        })
        .await;

        match received {
            Some(Ok(handle)) => {
                debug!(cycle = handle.number, "Printer resumed");
                self.activate(handle);
                Ok(())
            }
            Some(Err(_)) => {
                *self.phase.lock() = Phase::Closed;
                Err(PrinterError::LoopExited)
            }
            None => Err(PrinterError::NotPaused),
        }
    }

    async fn finish_cycle(
        &self,
        directive: Directive<R::Event, R::Warning>,
        after: AfterDrain<R::Event, R::Warning>,
    ) -> Result<(), PrinterError> {
        {
            let mut phase = self.phase.lock();
            let draining = match std::mem::replace(&mut *phase, Phase::Closed) {
                Phase::Active(ActiveCycle { status, done, next }) => {
                    // A failed send means the loop is gone; `done` reports that below.
                    let _ = next.send(directive);
                    drop(status);
                    Drain {
                        done,
                        after,
                        waiting: true,
                    }
                }
                Phase::Draining(drain) if !drain.waiting => {
                    debug!("Awaiting an interrupted drain");
                    Drain {
                        waiting: true,
                        ..drain
                    }
                }
                other => {
                    debug!(phase = other.name(), "No active cycle to finish");
                    *phase = other;
                    return Err(PrinterError::NotWritable);
                }
            };
            *phase = Phase::Draining(draining);
        }

        let _waiter = WaiterGuard { phase: &self.phase };
        let received = poll_fn(|cx| match &mut *self.phase.lock() {
            Phase::Draining(drain) => Pin::new(&mut drain.done).poll(cx).map(Some),
            _ => Poll::Ready(None),
        })
        .await;

        let mut phase = self.phase.lock();
        let drain = match std::mem::replace(&mut *phase, Phase::Closed) {
            Phase::Draining(drain) => drain,
            other => {
                *phase = other;
                return Err(PrinterError::NotWritable);
            }
        };
        match received {
            Some(Ok(outcome)) => {
                *phase = drain.after.into_phase();
                *self.warnings.lock() = outcome.warnings;
                match outcome.error {
                    Some(e) => Err(PrinterError::Render(e)),
                    None => Ok(()),
                }
            }
            _ => Err(PrinterError::LoopExited),
        }
    }

    /// Warnings collected by the most recently completed cycle.
    #[must_use]
    pub fn warnings(&self) -> Vec<R::Warning> {
        self.warnings.lock().clone()
    }

    /// Claims the log output of `id` for `claimant` in the current cycle.
    ///
    /// See [`LogSourceMap::claim`].
    pub fn validate_log_source(&self, id: &TraceId, claimant: &ClaimantId) -> bool {
        self.sources.claim(id, claimant)
    }

    /// Releases every trace id owned by `claimant`.
    ///
    /// Returns the number of claims released.
    pub fn clear_log_source(&self, claimant: &ClaimantId) -> usize {
        let released = self.sources.release_all(claimant);
        if released > 0 {
            debug!(%claimant, released, "Released log sources");
        }
        released
    }

    /// Hands out a producer handle bound to a fresh claimant.
    #[must_use]
    pub fn operation(self: &Arc<Self>, label: impl Into<String>) -> Operation<R> {
        Operation::new(Arc::clone(self), label)
    }

    /// Number of the current (or last) cycle, starting at 1.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(*self.phase.lock(), Phase::Paused(_))
    }

    /// Mode after the environment override.
    #[must_use]
    pub fn mode(&self) -> PrinterMode {
        self.mode
    }
}

impl<R: Renderer> std::fmt::Debug for Printer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer")
            .field("phase", &self.phase.lock().name())
            .field("cycle", &self.cycle())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
