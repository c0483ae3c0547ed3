//! Deferred, user-gated actions.
//!
//! A command that needs the user to pick a target parks its side effect
//! here and releases the execution gate. The next user gesture resumes it:
//!
//! ```text
//!   Idle --defer--> Awaiting --trigger--> Triggered --done/failed--> Idle
//!                      |                      |
//!                      +---cancel/expire------+--> Idle
//! ```
//!
//! All transitions happen under one short-held state lock; the effect itself
//! runs with the state lock released and the execution gate re-acquired.
//! While the state is `Triggered` every further trigger is reported as a
//! duplicate, so the effect runs at most once per defer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::DeferredError;
use crate::gate::{ExecutionGate, ExecutionPermit};
use crate::types::{ExecutionId, UserGesture};

pub type EffectResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Effect = Box<dyn FnOnce(&UserGesture) -> EffectResult + Send>;

/// A side effect waiting for a user gesture.
pub struct PendingAction {
    execution_id: ExecutionId,
    description: String,
    created_at: Instant,
    effect: Effect,
}

impl PendingAction {
    pub fn new(
        execution_id: ExecutionId,
        description: impl Into<String>,
        effect: impl FnOnce(&UserGesture) -> EffectResult + Send + 'static,
    ) -> Self {
        Self {
            execution_id,
            description: description.into(),
            created_at: Instant::now(),
            effect: Box::new(effect),
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl std::fmt::Debug for PendingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAction")
            .field("execution_id", &self.execution_id)
            .field("description", &self.description)
            .field("age", &self.age())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum DeferredState {
    Idle,
    Awaiting(PendingAction),
    Triggered {
        execution_id: ExecutionId,
        description: String,
    },
}

impl DeferredState {
    fn name(&self) -> &'static str {
        match self {
            DeferredState::Idle => "idle",
            DeferredState::Awaiting(_) => "awaiting",
            DeferredState::Triggered { .. } => "triggered",
        }
    }
}

/// Snapshot of the coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeferredStatus {
    Idle,
    Awaiting {
        execution_id: ExecutionId,
        description: String,
        waiting_ms: u64,
    },
    Triggered {
        execution_id: ExecutionId,
        description: String,
    },
}

impl DeferredStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, DeferredStatus::Idle)
    }

    pub fn execution_id(&self) -> Option<ExecutionId> {
        match self {
            DeferredStatus::Idle => None,
            DeferredStatus::Awaiting { execution_id, .. }
            | DeferredStatus::Triggered { execution_id, .. } => Some(*execution_id),
        }
    }
}

/// Result of a user gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// The pending effect ran to completion.
    Executed {
        execution_id: ExecutionId,
        elapsed_ms: u64,
    },
    /// Another gesture is already running the pending effect.
    Duplicate { execution_id: ExecutionId },
    /// Nothing was waiting for a gesture.
    NothingPending,
}

pub struct DeferredCoordinator {
    gate: Arc<ExecutionGate>,
    state: Mutex<DeferredState>,
    changed: Condvar,
    state_lock_timeout: Duration,
    resume_timeout: Duration,
}

impl DeferredCoordinator {
    pub fn new(gate: Arc<ExecutionGate>) -> Self {
        Self {
            gate,
            state: Mutex::new(DeferredState::Idle),
            changed: Condvar::new(),
            state_lock_timeout: Duration::from_secs(1),
            resume_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeouts(mut self, state_lock_timeout: Duration, resume_timeout: Duration) -> Self {
        self.state_lock_timeout = state_lock_timeout;
        self.resume_timeout = resume_timeout;
        self
    }

    pub fn gate(&self) -> &Arc<ExecutionGate> {
        &self.gate
    }

    /// Park `action` and hand the execution gate back.
    ///
    /// The permit is consumed whatever the outcome, so the gate is free when
    /// this returns.
    pub fn defer(
        &self,
        permit: ExecutionPermit<'_>,
        action: PendingAction,
    ) -> Result<ExecutionId, DeferredError> {
        let mut state = self.lock_state()?;

        match &*state {
            DeferredState::Idle => {}
            DeferredState::Awaiting(pending) => {
                return Err(DeferredError::AlreadyPending {
                    pending: pending.execution_id,
                });
            }
            DeferredState::Triggered { execution_id, .. } => {
                return Err(DeferredError::AlreadyPending {
                    pending: *execution_id,
                });
            }
        }

        let execution_id = action.execution_id;
        info!(
            execution_id = %execution_id.short(),
            description = %action.description,
            "deferred action awaiting user gesture"
        );
        *state = DeferredState::Awaiting(action);
        drop(permit);
        drop(state);
        self.changed.notify_all();
        Ok(execution_id)
    }

    /// Resume the pending action, if any, in response to `gesture`.
    pub fn trigger(&self, gesture: UserGesture) -> Result<TriggerOutcome, DeferredError> {
        let action = {
            let mut state = self.lock_state()?;
            match std::mem::replace(&mut *state, DeferredState::Idle) {
                DeferredState::Idle => {
                    debug!(x = gesture.x, y = gesture.y, "gesture with nothing pending");
                    return Ok(TriggerOutcome::NothingPending);
                }
                DeferredState::Triggered {
                    execution_id,
                    description,
                } => {
                    info!(execution_id = %execution_id.short(), "duplicate gesture ignored");
                    *state = DeferredState::Triggered {
                        execution_id,
                        description,
                    };
                    return Ok(TriggerOutcome::Duplicate { execution_id });
                }
                DeferredState::Awaiting(action) => {
                    *state = DeferredState::Triggered {
                        execution_id: action.execution_id,
                        description: action.description.clone(),
                    };
                    action
                }
            }
        };
        self.changed.notify_all();

        // From here every exit path, including unwinding, returns to Idle.
        let reset = ResetOnDrop { coordinator: self };
        let execution_id = action.execution_id;
        info!(
            execution_id = %execution_id.short(),
            x = gesture.x,
            y = gesture.y,
            waited_ms = action.age().as_millis() as u64,
            "user gesture received, resuming deferred action"
        );

        let permit = match self
            .gate
            .acquire(format!("deferred:{}", execution_id.short()), self.resume_timeout)
        {
            Ok(permit) => permit,
            Err(e) => {
                warn!(execution_id = %execution_id.short(), error = %e, "deferred action abandoned");
                return Err(DeferredError::ResumeTimeout {
                    execution_id,
                    waited: self.resume_timeout,
                });
            }
        };

        let started = Instant::now();
        let result = (action.effect)(&gesture);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        drop(permit);
        drop(reset);

        match result {
            Ok(()) => {
                info!(execution_id = %execution_id.short(), elapsed_ms, "deferred action completed");
                Ok(TriggerOutcome::Executed {
                    execution_id,
                    elapsed_ms,
                })
            }
            Err(source) => {
                warn!(execution_id = %execution_id.short(), error = %source, "deferred action failed");
                Err(DeferredError::Effect {
                    execution_id,
                    source,
                })
            }
        }
    }

    pub fn status(&self) -> Result<DeferredStatus, DeferredError> {
        let state = self.lock_state()?;
        Ok(match &*state {
            DeferredState::Idle => DeferredStatus::Idle,
            DeferredState::Awaiting(pending) => DeferredStatus::Awaiting {
                execution_id: pending.execution_id,
                description: pending.description.clone(),
                waiting_ms: pending.age().as_millis() as u64,
            },
            DeferredState::Triggered {
                execution_id,
                description,
            } => DeferredStatus::Triggered {
                execution_id: *execution_id,
                description: description.clone(),
            },
        })
    }

    /// Drop an awaiting action without running it. A triggered action is
    /// already running and is left alone.
    pub fn cancel(&self) -> Result<Option<ExecutionId>, DeferredError> {
        let mut state = self.lock_state()?;
        let cancelled = Self::take_awaiting(&mut state);
        drop(state);
        if let Some(id) = cancelled {
            info!(execution_id = %id.short(), "deferred action cancelled");
            self.changed.notify_all();
        }
        Ok(cancelled)
    }

    /// Cancel the awaiting action if it has waited at least `max_age`.
    pub fn expire_stale(&self, max_age: Duration) -> Result<Option<ExecutionId>, DeferredError> {
        let mut state = self.lock_state()?;
        let stale = matches!(&*state, DeferredState::Awaiting(p) if p.age() >= max_age);
        if !stale {
            return Ok(None);
        }
        let expired = Self::take_awaiting(&mut state);
        drop(state);
        if let Some(id) = expired {
            warn!(execution_id = %id.short(), ?max_age, "deferred action expired");
            self.changed.notify_all();
        }
        Ok(expired)
    }

    /// Block until the coordinator is idle or `timeout` passes.
    pub fn wait_until_idle(&self, timeout: Duration) -> Result<(), DeferredError> {
        let deadline = Instant::now() + timeout;
        let mut state = self
            .state
            .try_lock_until(deadline)
            .ok_or(DeferredError::StateLockTimeout(timeout))?;

        while !matches!(*state, DeferredState::Idle) {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                if matches!(*state, DeferredState::Idle) {
                    break;
                }
                return Err(DeferredError::WaitTimeout {
                    state: state.name(),
                    waited: timeout,
                });
            }
        }
        Ok(())
    }

    fn take_awaiting(state: &mut DeferredState) -> Option<ExecutionId> {
        match std::mem::replace(state, DeferredState::Idle) {
            DeferredState::Awaiting(pending) => Some(pending.execution_id),
            other => {
                *state = other;
                None
            }
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, DeferredState>, DeferredError> {
        self.state
            .try_lock_for(self.state_lock_timeout)
            .ok_or(DeferredError::StateLockTimeout(self.state_lock_timeout))
    }
}

impl std::fmt::Debug for DeferredCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredCoordinator")
            .field("state_lock_timeout", &self.state_lock_timeout)
            .field("resume_timeout", &self.resume_timeout)
            .finish_non_exhaustive()
    }
}

/// Returns a triggered coordinator to `Idle` when dropped.
struct ResetOnDrop<'a> {
    coordinator: &'a DeferredCoordinator,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        let Ok(mut state) = self.coordinator.lock_state() else {
            error!(
                timeout = ?self.coordinator.state_lock_timeout,
                "could not reset deferred state; coordinator left triggered"
            );
            return;
        };
        *state = DeferredState::Idle;
        drop(state);
        self.coordinator.changed.notify_all();
        debug!("deferred state reset to idle");
    }
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
