//! Status channel: the per-cycle conduit between producers and the renderer.
//!
//! ```text
//! producers ──write()──► StatusSender ──(bounded mpsc)──► StatusReceiver ──► Renderer
//!                         (controller)                     (reporting loop)
//! ```
//!
//! A new channel is created for every reporting cycle. The controller holds
//! the only long-lived [`StatusSender`]; dropping it is the end-of-stream
//! signal the renderer drains towards.
//!
//! # Example
//!
//! ```
//! use pulse_printer::status;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = status::channel::<u32>(4);
//!     tx.send(1).await.unwrap();
//!     tx.send(2).await.unwrap();
//!     drop(tx);
//!
//!     assert_eq!(rx.recv().await, Some(1));
//!     assert_eq!(rx.recv().await, Some(2));
//!     assert_eq!(rx.recv().await, None);
//! }
//! ```

use crate::PrinterError;
use tokio::sync::mpsc;

/// Default number of status events buffered before `write` applies
/// backpressure.
pub const DEFAULT_STATUS_BUFFER: usize = 16;

/// Creates a bounded status channel.
///
/// A capacity of zero is raised to one; tokio channels cannot rendezvous.
#[must_use]
pub fn channel<E>(capacity: usize) -> (StatusSender<E>, StatusReceiver<E>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (StatusSender { tx }, StatusReceiver { rx })
}

/// Sending half of a status channel.
pub struct StatusSender<E> {
    tx: mpsc::Sender<E>,
}

impl<E> StatusSender<E> {
    /// Sends an event, waiting while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns [`PrinterError::StatusClosed`] if the receiver was dropped.
    pub async fn send(&self, event: E) -> Result<(), PrinterError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| PrinterError::StatusClosed)
    }

    /// Returns `true` if the receiver was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<E> Clone for StatusSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> std::fmt::Debug for StatusSender<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSender")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

/// Receiving half of a status channel. Owned by the renderer for one cycle.
pub struct StatusReceiver<E> {
    rx: mpsc::Receiver<E>,
}

impl<E> StatusReceiver<E> {
    /// Receives the next event.
    ///
    /// Returns `None` once every sender is dropped and the buffer is empty.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Receives an event if one is buffered.
    #[must_use]
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Takes every currently buffered event without waiting.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Consumes events until the stream closes, discarding them.
    ///
    /// Returns the number of events discarded.
    pub async fn discard_all(&mut self) -> usize {
        let mut count = 0;
        while self.rx.recv().await.is_some() {
            count += 1;
        }
        count
    }
}

impl<E> std::fmt::Debug for StatusReceiver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReceiver").finish_non_exhaustive()
    }
}
