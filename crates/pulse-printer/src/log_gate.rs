//! Gate that holds process log output while progress renders.
//!
//! A [`LogGate`] is shared between:
//! - the reporting loop, which pauses it for the duration of every cycle
//! - the log writer (a `tracing` `MakeWriter` in the CLI), which submits
//!   each formatted log record through it
//!
//! While paused, records are held in order; when the last
//! [`LogGateGuard`] is dropped they are flushed to the gate's writer.
//! The hold buffer is bounded by [`MAX_HELD_LINES`]; records beyond it are
//! dropped and counted, and a single notice reports the count on flush.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Maximum number of records held while paused.
pub const MAX_HELD_LINES: usize = 1000;

/// Result of submitting a record to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    /// Written straight to the output.
    Passed,
    /// Held until the gate reopens.
    Held,
    /// Hold buffer full; record discarded.
    Dropped,
}

struct GateState {
    depth: usize,
    held: Vec<Vec<u8>>,
    dropped: usize,
    out: Box<dyn Write + Send>,
}

/// Shared, cloneable log gate.
#[derive(Clone)]
pub struct LogGate {
    inner: Arc<Mutex<GateState>>,
}

impl LogGate {
    /// Creates an open gate writing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(std::io::stderr())
    }

    /// Creates an open gate writing to `out`.
    #[must_use]
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(GateState {
                depth: 0,
                held: Vec::new(),
                dropped: 0,
                out: Box::new(out),
            })),
        }
    }

    /// Closes the gate until the returned guard (and every other
    /// outstanding guard) is dropped.
    #[must_use = "the gate reopens when the guard is dropped"]
    pub fn pause(&self) -> LogGateGuard {
        self.inner.lock().depth += 1;
        LogGateGuard { gate: self.clone() }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.lock().depth > 0
    }

    /// Number of records currently held.
    #[must_use]
    pub fn held_len(&self) -> usize {
        self.inner.lock().held.len()
    }

    /// Writes `record` now, or holds it while the gate is paused.
    pub fn submit(&self, record: Vec<u8>) -> GateResult {
        let mut state = self.inner.lock();
        if state.depth == 0 {
            let _ = state.out.write_all(&record);
            let _ = state.out.flush();
            return GateResult::Passed;
        }
        if state.held.len() >= MAX_HELD_LINES {
            state.dropped += 1;
            return GateResult::Dropped;
        }
        state.held.push(record);
        GateResult::Held
    }

    fn release(&self) {
        let mut state = self.inner.lock();
        state.depth = state.depth.saturating_sub(1);
        if state.depth > 0 {
            return;
        }

        let held = std::mem::take(&mut state.held);
        for record in &held {
            let _ = state.out.write_all(record);
        }
        let dropped = std::mem::take(&mut state.dropped);
        if dropped > 0 {
            let _ = writeln!(
                state.out,
                "{dropped} log line(s) dropped while progress was displayed"
            );
        }
        let _ = state.out.flush();
    }
}

impl Default for LogGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("LogGate")
            .field("depth", &state.depth)
            .field("held", &state.held.len())
            .field("dropped", &state.dropped)
            .finish_non_exhaustive()
    }
}

/// Keeps a [`LogGate`] paused while alive.
#[derive(Debug)]
pub struct LogGateGuard {
    gate: LogGate,
}

impl Drop for LogGateGuard {
    fn drop(&mut self) {
        self.gate.release();
    }
}
