//! Command execution.
//!
//! [`Orchestrator::run_command`] holds the execution gate while a command is
//! planned and its immediate steps run. A deferred plan hands the gate to the
//! [`DeferredCoordinator`] and returns `WaitingForUserAction` straight away;
//! [`Orchestrator::handle_user_click`] later resumes it.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use aura_config::ExecutionConfig;
use aura_input::{Clipboard, InjectionStrategy, InputPort, TextInjector};
use serde::Serialize;
use tracing::{debug, info};

use crate::deferred::{DeferredCoordinator, DeferredStatus, PendingAction, TriggerOutcome};
use crate::error::OrchestratorError;
use crate::gate::ExecutionGate;
use crate::planner::{CommandPlan, CommandPlanner, InputStep};
use crate::types::{ExecutionId, UserGesture};

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    Completed {
        execution_id: ExecutionId,
        steps: usize,
        elapsed_ms: u64,
    },
    WaitingForUserAction {
        execution_id: ExecutionId,
        description: String,
    },
}

impl CommandOutcome {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            CommandOutcome::Completed { execution_id, .. }
            | CommandOutcome::WaitingForUserAction { execution_id, .. } => *execution_id,
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, CommandOutcome::WaitingForUserAction { .. })
    }
}

pub struct Orchestrator {
    gate: Arc<ExecutionGate>,
    deferred: Arc<DeferredCoordinator>,
    planner: Arc<dyn CommandPlanner>,
    input: Arc<dyn InputPort>,
    clipboard: Arc<dyn Clipboard>,
    injector: TextInjector,
    command_timeout: Duration,
    awaiting_expiry: Option<Duration>,
    focus_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &ExecutionConfig,
        planner: Arc<dyn CommandPlanner>,
        input: Arc<dyn InputPort>,
        clipboard: Arc<dyn Clipboard>,
        injector: TextInjector,
    ) -> Self {
        let gate = Arc::new(ExecutionGate::new());
        let deferred = Arc::new(
            DeferredCoordinator::new(gate.clone())
                .with_timeouts(config.state_lock_timeout(), config.resume_timeout()),
        );
        Self {
            gate,
            deferred,
            planner,
            input,
            clipboard,
            injector,
            command_timeout: config.command_timeout(),
            awaiting_expiry: config.awaiting_expiry(),
            focus_delay: config.focus_delay(),
        }
    }

    pub fn gate(&self) -> &Arc<ExecutionGate> {
        &self.gate
    }

    pub fn deferred(&self) -> &Arc<DeferredCoordinator> {
        &self.deferred
    }

    pub fn input(&self) -> &Arc<dyn InputPort> {
        &self.input
    }

    /// Run one command. Blocks at most the command timeout for the gate.
    pub fn run_command(&self, command: &str) -> Result<CommandOutcome, OrchestratorError> {
        if let Some(max_age) = self.awaiting_expiry {
            self.deferred.expire_stale(max_age)?;
        }

        let execution_id = ExecutionId::new();
        let permit = self
            .gate
            .acquire(format!("command:{}", execution_id.short()), self.command_timeout)?;
        let started = Instant::now();
        info!(execution_id = %execution_id.short(), backend = self.input.name(), "command started");

        match self.planner.plan(command)? {
            CommandPlan::Immediate(steps) => {
                for step in &steps {
                    self.execute_step(step)?;
                }
                drop(permit);
                let elapsed_ms = started.elapsed().as_millis() as u64;
                info!(execution_id = %execution_id.short(), steps = steps.len(), elapsed_ms, "command completed");
                Ok(CommandOutcome::Completed {
                    execution_id,
                    steps: steps.len(),
                    elapsed_ms,
                })
            }
            CommandPlan::Deferred {
                description,
                content,
            } => {
                let action = self.delivery(execution_id, description.clone(), content);
                let execution_id = self.deferred.defer(permit, action)?;
                Ok(CommandOutcome::WaitingForUserAction {
                    execution_id,
                    description,
                })
            }
        }
    }

    /// Forward a user click to the pending action.
    pub fn handle_user_click(&self, gesture: UserGesture) -> Result<TriggerOutcome, OrchestratorError> {
        Ok(self.deferred.trigger(gesture)?)
    }

    pub fn status(&self) -> Result<DeferredStatus, OrchestratorError> {
        Ok(self.deferred.status()?)
    }

    fn execute_step(&self, step: &InputStep) -> Result<(), OrchestratorError> {
        debug!(?step, "executing step");
        match step {
            InputStep::TypeText(text) => {
                self.injector
                    .inject(self.input.as_ref(), self.clipboard.as_ref(), text)?;
            }
            InputStep::Paste(text) => {
                self.injector
                    .clone()
                    .with_strategy(InjectionStrategy::ClipboardPaste)
                    .inject(self.input.as_ref(), self.clipboard.as_ref(), text)?;
            }
            InputStep::KeyPress(chord) => self.input.key_press(chord)?,
            InputStep::Click { x, y } => self.input.click(*x, *y)?,
        }
        Ok(())
    }

    /// The deferred half: focus the clicked target, then deliver `content`.
    fn delivery(&self, execution_id: ExecutionId, description: String, content: String) -> PendingAction {
        let input = self.input.clone();
        let clipboard = self.clipboard.clone();
        let injector = self.injector.clone();
        let focus_delay = self.focus_delay;

        PendingAction::new(execution_id, description, move |gesture: &UserGesture| {
            input.click(gesture.x, gesture.y)?;
            if !focus_delay.is_zero() {
                thread::sleep(focus_delay);
            }
            let report = injector.inject(input.as_ref(), clipboard.as_ref(), &content)?;
            debug!(?report, "deferred content delivered");
            Ok(())
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("backend", &self.input.name())
            .field("command_timeout", &self.command_timeout)
            .field("awaiting_expiry", &self.awaiting_expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
