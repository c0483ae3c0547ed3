//! The execution gate.
//!
//! One lock serializes every desktop-affecting action: command processing
//! and the resumed half of a deferred action alike. Acquisition always has a
//! deadline so a wedged holder surfaces as an error instead of a hang.

use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::GateError;

#[derive(Debug, Default)]
pub struct ExecutionGate {
    lock: Mutex<()>,
    holder: Mutex<Option<String>>,
}

impl ExecutionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for the gate.
    pub fn acquire(
        &self,
        owner: impl Into<String>,
        timeout: Duration,
    ) -> Result<ExecutionPermit<'_>, GateError> {
        let owner = owner.into();
        match self.lock.try_lock_for(timeout) {
            Some(guard) => Ok(self.permit(guard, owner)),
            None => {
                let holder = self.holder();
                warn!(owner = %owner, holder = ?holder, ?timeout, "execution gate acquisition timed out");
                Err(GateError::Timeout {
                    owner,
                    waited: timeout,
                    holder,
                })
            }
        }
    }

    /// Take the gate only if it is free right now.
    pub fn try_acquire(&self, owner: impl Into<String>) -> Option<ExecutionPermit<'_>> {
        let owner = owner.into();
        self.lock.try_lock().map(|guard| self.permit(guard, owner))
    }

    pub fn is_free(&self) -> bool {
        !self.lock.is_locked()
    }

    /// Label of the current holder, if any.
    pub fn holder(&self) -> Option<String> {
        self.holder.lock().clone()
    }

    fn permit<'a>(&'a self, guard: MutexGuard<'a, ()>, owner: String) -> ExecutionPermit<'a> {
        debug!(owner = %owner, "execution gate acquired");
        *self.holder.lock() = Some(owner.clone());
        ExecutionPermit {
            gate: self,
            _guard: guard,
            owner,
            acquired_at: Instant::now(),
        }
    }
}

/// Proof of holding the execution gate. Dropping it releases the gate.
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct ExecutionPermit<'a> {
    gate: &'a ExecutionGate,
    _guard: MutexGuard<'a, ()>,
    owner: String,
    acquired_at: Instant,
}

impl ExecutionPermit<'_> {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl std::fmt::Debug for ExecutionPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPermit")
            .field("owner", &self.owner)
            .field("held_for", &self.held_for())
            .finish()
    }
}

impl Drop for ExecutionPermit<'_> {
    fn drop(&mut self) {
        // Cleared before `_guard` drops so a new holder never sees a stale label.
        *self.gate.holder.lock() = None;
        debug!(owner = %self.owner, held_ms = self.held_for().as_millis() as u64, "execution gate released");
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
