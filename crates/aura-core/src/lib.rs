//! Command execution core for AURA.
//!
//! - [`ExecutionGate`] - one desktop-affecting action at a time
//! - [`DeferredCoordinator`] - parks user-gated actions off the gate
//! - [`Orchestrator`] - plans commands and drives the [`aura_input::InputPort`]

mod deferred;
mod error;
mod gate;
mod orchestrator;
mod planner;
mod types;

pub use deferred::{DeferredCoordinator, DeferredStatus, EffectResult, PendingAction, TriggerOutcome};
pub use error::{DeferredError, GateError, OrchestratorError, PlanError};
pub use gate::{ExecutionGate, ExecutionPermit};
pub use orchestrator::{CommandOutcome, Orchestrator};
pub use planner::{CommandPlan, CommandPlanner, InputStep, ScriptedPlanner};
pub use types::{ExecutionId, UserGesture};
