//! Diagnostics for AURA.
//!
//! Report producers behind the `doctor`, `permissions`, `tree` and `find`
//! commands. Nothing here changes system state.

pub mod accessibility;
mod endpoint;
mod error;
pub mod health;
pub mod permissions;
mod script;

use std::sync::Arc;

use aura_config::Config;

pub use accessibility::{
    AccessibilityDebugger, DetectionAnalysis, ElementMatch, ElementSummary, OsascriptAccessibilityDebugger, TreeDump,
};
pub use endpoint::{EndpointReport, ModelEndpointProbe};
pub use error::ProbeError;
pub use health::{
    Benchmark, HealthChecker, HealthIssue, HealthReport, HealthStatus, IssueCategory, Severity, SystemHealthChecker,
};
pub use permissions::{PermissionLevel, PermissionReport, PermissionValidator, SystemEventsValidator};
pub use script::{CannedScriptRunner, ScriptOutput, ScriptRunner, TokioScriptRunner, osascript_args};

/// Wire the system checker from configuration.
pub fn health_checker_from_config(config: &Config) -> Result<SystemHealthChecker, ProbeError> {
    let runner: Arc<dyn ScriptRunner> = Arc::new(TokioScriptRunner::new(config.diagnostics.probe_timeout()));
    let checker = SystemHealthChecker::new(
        config.diagnostics.clone(),
        runner.clone(),
        Arc::new(SystemEventsValidator::new(runner.clone())),
        Arc::new(OsascriptAccessibilityDebugger::new(runner)),
    );
    if config.diagnostics.skip_model_probe {
        return Ok(checker);
    }
    Ok(checker.with_endpoint(ModelEndpointProbe::new(&config.model)?))
}
