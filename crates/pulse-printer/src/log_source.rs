//! Log-source ownership table.
//!
//! When several concurrent operations share a unit of work (the same
//! [`TraceId`]), only one of them may attribute log lines to it at a time.
//! [`LogSourceMap`] records the current claimant per trace id:
//!
//! ```text
//! claim(H1, A) -> true    H1 unowned, A becomes owner
//! claim(H1, A) -> true    idempotent for the owner
//! claim(H1, B) -> false   owned by A, B must skip the log line
//! release_all(A)          H1 freed
//! claim(H1, B) -> true
//! ```
//!
//! The table is owned by one printer and reset at the start of every
//! reporting cycle.

use parking_lot::Mutex;
use pulse_types::{ClaimantId, TraceId};
use std::collections::HashMap;

/// Result of [`LogSourceMap::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// `id` was unowned; the claim is now recorded.
    Acquired,
    /// The claimant already owned `id`.
    Held,
    /// Another claimant owns `id`.
    Denied,
}

/// Mapping from trace id to its current claimant.
///
/// Generic over the claimant type; equality on `C` decides ownership.
/// All operations take the same lock.
#[derive(Debug)]
pub struct LogSourceMap<C = ClaimantId> {
    owners: Mutex<HashMap<TraceId, C>>,
}

impl<C: Eq + Clone> LogSourceMap<C> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
        }
    }

    /// Claims `id` for `claimant`.
    ///
    /// Returns `true` if `id` was unowned (the claim is recorded) or is
    /// already owned by `claimant`. Returns `false` if another claimant owns
    /// it; the caller should not emit the log line.
    pub fn claim(&self, id: &TraceId, claimant: &C) -> bool {
        self.acquire(id, claimant) != Claim::Denied
    }

    /// Like [`claim`](Self::claim), but tells a fresh claim apart from one
    /// `claimant` already held.
    pub fn acquire(&self, id: &TraceId, claimant: &C) -> Claim {
        let mut owners = self.owners.lock();
        match owners.get(id) {
            Some(owner) if owner == claimant => Claim::Held,
            Some(_) => Claim::Denied,
            None => {
                owners.insert(id.clone(), claimant.clone());
                Claim::Acquired
            }
        }
    }

    /// Removes the entry for `id` if `claimant` owns it.
    ///
    /// Returns whether an entry was removed.
    pub fn release(&self, id: &TraceId, claimant: &C) -> bool {
        let mut owners = self.owners.lock();
        if owners.get(id) == Some(claimant) {
            owners.remove(id);
            true
        } else {
            false
        }
    }

    /// Removes every entry owned by `claimant`.
    ///
    /// Returns the number of trace ids released.
    pub fn release_all(&self, claimant: &C) -> usize {
        let mut owners = self.owners.lock();
        let before = owners.len();
        owners.retain(|_, owner| owner != claimant);
        before - owners.len()
    }

    /// Drops every claim.
    pub fn reset(&self) {
        *self.owners.lock() = HashMap::new();
    }

    /// Returns the current owner of `id`.
    #[must_use]
    pub fn owner(&self, id: &TraceId) -> Option<C> {
        self.owners.lock().get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.lock().is_empty()
    }
}

impl<C: Eq + Clone> Default for LogSourceMap<C> {
    fn default() -> Self {
        Self::new()
    }
}
