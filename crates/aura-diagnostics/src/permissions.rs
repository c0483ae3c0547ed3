//! macOS permission checks.
//!
//! Three probes through System Events, each mapped to the permission it
//! exercises:
//! - automation: sending Apple events to System Events at all
//! - accessibility: UI scripting enabled for this process
//! - ui-inspection: reading the frontmost window

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ProbeError;
use crate::script::ScriptRunner;

/// "Not authorized to send Apple events".
pub const ERR_NOT_AUTHORIZED: i32 = -1743;
/// "Not allowed assistive access".
pub const ERR_ASSISTIVE_ACCESS: i32 = -25211;
/// "Invalid index", usually no window to inspect.
pub const ERR_INVALID_INDEX: i32 = -1719;

pub const AUTOMATION: &str = "automation";
pub const ACCESSIBILITY: &str = "accessibility";
pub const UI_INSPECTION: &str = "ui-inspection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Full,
    Partial,
    None,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionLevel::Full => write!(f, "full"),
            PermissionLevel::Partial => write!(f, "partial"),
            PermissionLevel::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionReport {
    /// Whether this process may drive other apps through accessibility.
    pub trusted: bool,
    pub level: PermissionLevel,
    pub granted: Vec<String>,
    pub missing: Vec<String>,
    pub recommendations: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl PermissionReport {
    fn from_probes(granted: Vec<String>, missing: Vec<String>, recommendations: Vec<String>) -> Self {
        let level = match (granted.is_empty(), missing.is_empty()) {
            (_, true) => PermissionLevel::Full,
            (true, false) => PermissionLevel::None,
            (false, false) => PermissionLevel::Partial,
        };
        Self {
            trusted: granted.iter().any(|p| p == ACCESSIBILITY),
            level,
            granted,
            missing,
            recommendations,
            checked_at: Utc::now(),
        }
    }

    pub fn is_missing(&self, permission: &str) -> bool {
        self.missing.iter().any(|p| p == permission)
    }
}

#[async_trait]
pub trait PermissionValidator: Send + Sync {
    async fn check_accessibility_permissions(&self) -> PermissionReport;
}

/// Probes permissions by asking System Events for progressively more.
pub struct SystemEventsValidator {
    runner: Arc<dyn ScriptRunner>,
}

enum Probe {
    Granted,
    /// Carries the remediation hint.
    Missing(String),
}

impl SystemEventsValidator {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    async fn probe_automation(&self) -> Probe {
        match self
            .runner
            .osascript(r#"tell application "System Events" to get name of first process"#)
            .await
        {
            Ok(_) => Probe::Granted,
            Err(e) => classify(e, |code| match code {
                Some(ERR_NOT_AUTHORIZED) => {
                    "Allow your terminal to control System Events: System Settings > Privacy & Security > Automation".to_string()
                }
                _ => "System Events did not answer; check that it is not blocked by a profile".to_string(),
            }),
        }
    }

    async fn probe_accessibility(&self) -> Probe {
        match self
            .runner
            .osascript(r#"tell application "System Events" to get UI elements enabled"#)
            .await
        {
            Ok(out) if out.stdout.trim() == "true" => Probe::Granted,
            Ok(_) => Probe::Missing(ACCESSIBILITY_HINT.to_string()),
            Err(e) => classify(e, |_| ACCESSIBILITY_HINT.to_string()),
        }
    }

    async fn probe_window_access(&self) -> Probe {
        let script = r#"
            tell application "System Events"
                set frontApp to first process whose frontmost is true
                return name of frontApp & tab & (count of windows of frontApp)
            end tell
        "#;
        match self.runner.osascript(script).await {
            Ok(out) => {
                debug!(front = %out.stdout.trim(), "front window probe");
                Probe::Granted
            }
            Err(e) => classify(e, |code| match code {
                Some(ERR_ASSISTIVE_ACCESS) => ACCESSIBILITY_HINT.to_string(),
                Some(ERR_INVALID_INDEX) => "No frontmost window to inspect; focus an app window and retry".to_string(),
                _ => "Reading the frontmost window failed; re-run with RUST_LOG=debug".to_string(),
            }),
        }
    }
}

const ACCESSIBILITY_HINT: &str =
    "Add your terminal to System Settings > Privacy & Security > Accessibility, then restart it";

fn classify(err: ProbeError, hint: impl FnOnce(Option<i32>) -> String) -> Probe {
    debug!(error = %err, "permission probe failed");
    match &err {
        ProbeError::Spawn { .. } => {
            Probe::Missing(format!("osascript could not run ({}); AURA requires macOS", err))
        }
        ProbeError::Timeout { .. } => {
            Probe::Missing("System Events timed out; a permission prompt may be waiting for an answer".to_string())
        }
        _ => Probe::Missing(hint(err.applescript_code())),
    }
}

#[async_trait]
impl PermissionValidator for SystemEventsValidator {
    async fn check_accessibility_permissions(&self) -> PermissionReport {
        let probes = [
            (AUTOMATION, self.probe_automation().await),
            (ACCESSIBILITY, self.probe_accessibility().await),
            (UI_INSPECTION, self.probe_window_access().await),
        ];

        let mut granted = Vec::new();
        let mut missing = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();

        for (name, probe) in probes {
            match probe {
                Probe::Granted => granted.push(name.to_string()),
                Probe::Missing(hint) => {
                    missing.push(name.to_string());
                    if !recommendations.contains(&hint) {
                        recommendations.push(hint);
                    }
                }
            }
        }

        let report = PermissionReport::from_probes(granted, missing, recommendations);
        info!(level = %report.level, trusted = report.trusted, missing = ?report.missing, "permission check finished");
        report
    }
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;
