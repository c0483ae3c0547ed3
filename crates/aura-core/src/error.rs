//! Core error types.

use std::time::Duration;

use aura_input::{InjectionError, InputError};
use thiserror::Error;

use crate::types::ExecutionId;

/// Execution gate errors.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("{owner} timed out after {waited:?} waiting for the execution gate (held by {holder:?})")]
    Timeout {
        owner: String,
        waited: Duration,
        holder: Option<String>,
    },
}

/// Deferred-action errors.
#[derive(Debug, Error)]
pub enum DeferredError {
    #[error("Timed out after {0:?} waiting for the deferred-action state lock")]
    StateLockTimeout(Duration),

    #[error("Deferred action {pending} is already pending")]
    AlreadyPending { pending: ExecutionId },

    #[error("Deferred action {execution_id} could not re-acquire the execution gate within {waited:?}")]
    ResumeTimeout {
        execution_id: ExecutionId,
        waited: Duration,
    },

    #[error("Deferred action {execution_id} failed: {source}")]
    Effect {
        execution_id: ExecutionId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Deferred action still {state} after {waited:?}")]
    WaitTimeout { state: &'static str, waited: Duration },
}

/// Command planning errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument for {command}: {message}")]
    InvalidArgument { command: String, message: String },
}

/// Orchestrator errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Deferred(#[from] DeferredError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Injection(#[from] InjectionError),
}
