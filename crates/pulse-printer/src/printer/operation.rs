//! Per-producer handles.

use super::Printer;
use crate::log_source::Claim;
use crate::render::Renderer;
use crate::PrinterError;
use pulse_types::{ClaimantId, TraceId};
use std::sync::Arc;

/// Send-only handle for one concurrent producer.
///
/// Bound to a fresh [`ClaimantId`]. Every trace id claimed through
/// [`write_log`](Self::write_log) is released when the handle is finished
/// or dropped.
pub struct Operation<R: Renderer> {
    printer: Arc<Printer<R>>,
    claimant: ClaimantId,
}

impl<R: Renderer> Operation<R> {
    pub(super) fn new(printer: Arc<Printer<R>>, label: impl Into<String>) -> Self {
        Self {
            printer,
            claimant: ClaimantId::new(label),
        }
    }

    /// Forwards `event` to the printer.
    ///
    /// # Errors
    ///
    /// See [`Printer::write`].
    pub async fn write(&self, event: R::Event) -> Result<(), PrinterError> {
        self.printer.write(event).await
    }

    /// Forwards `event` if this operation owns the log output of `id`.
    ///
    /// Returns `Ok(false)` and drops the event when another operation owns
    /// `id` in the current cycle. A claim taken by a call whose write fails
    /// is given back.
    ///
    /// # Errors
    ///
    /// See [`Printer::write`].
    pub async fn write_log(&self, id: &TraceId, event: R::Event) -> Result<bool, PrinterError> {
        let claim = self.printer.sources.acquire(id, &self.claimant);
        if claim == Claim::Denied {
            return Ok(false);
        }
        if let Err(e) = self.printer.write(event).await {
            if claim == Claim::Acquired {
                self.printer.sources.release(id, &self.claimant);
            }
            return Err(e);
        }
        Ok(true)
    }

    #[must_use]
    pub fn claimant(&self) -> &ClaimantId {
        &self.claimant
    }

    /// Releases every trace id claimed by this operation.
    ///
    /// Returns the number of claims released.
    pub fn finish(self) -> usize {
        self.printer.clear_log_source(&self.claimant)
    }
}

impl<R: Renderer> Drop for Operation<R> {
    fn drop(&mut self) {
        self.printer.clear_log_source(&self.claimant);
    }
}

impl<R: Renderer> std::fmt::Debug for Operation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("claimant", &self.claimant)
            .finish_non_exhaustive()
    }
}
