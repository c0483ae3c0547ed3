//! Health check.
//!
//! Score starts at 100 and loses a fixed penalty per issue:
//! critical 40, high 20, medium 10, low 5.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use aura_config::DiagnosticsConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accessibility::AccessibilityDebugger;
use crate::endpoint::{EndpointReport, ModelEndpointProbe};
use crate::permissions::{PermissionReport, PermissionValidator, ACCESSIBILITY, AUTOMATION};
use crate::script::ScriptRunner;

/// Scores below this are degraded.
pub const HEALTHY_SCORE: u8 = 80;

const OSASCRIPT_BUDGET_MS: u64 = 1_000;
const TREE_BUDGET_MS: u64 = 3_000;
const COMPLETION_BUDGET_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn penalty(self) -> u32 {
        match self {
            Severity::Low => 5,
            Severity::Medium => 10,
            Severity::High => 20,
            Severity::Critical => 40,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Tools,
    Permissions,
    Accessibility,
    Model,
    Performance,
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueCategory::Tools => write!(f, "tools"),
            IssueCategory::Permissions => write!(f, "permissions"),
            IssueCategory::Accessibility => write!(f, "accessibility"),
            IssueCategory::Model => write!(f, "model"),
            IssueCategory::Performance => write!(f, "performance"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthIssue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl HealthIssue {
    pub fn new(category: IssueCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benchmark {
    pub name: String,
    pub elapsed_ms: u64,
    pub budget_ms: u64,
    pub ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: u8,
    pub status: HealthStatus,
    pub issues: Vec<HealthIssue>,
    pub benchmarks: Vec<Benchmark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<EndpointReport>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(mut issues: Vec<HealthIssue>, benchmarks: Vec<Benchmark>) -> Self {
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        let score = score(&issues);
        let status = match exit_code_for(score, &issues) {
            0 => HealthStatus::Healthy,
            1 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        Self {
            score,
            status,
            issues,
            benchmarks,
            permissions: None,
            model: None,
            checked_at: Utc::now(),
        }
    }

    /// 0 healthy, 1 degraded, 2 critical.
    pub fn exit_code(&self) -> i32 {
        exit_code_for(self.score, &self.issues)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

pub fn score(issues: &[HealthIssue]) -> u8 {
    let penalty: u32 = issues.iter().map(|i| i.severity.penalty()).sum();
    100u32.saturating_sub(penalty) as u8
}

fn exit_code_for(score: u8, issues: &[HealthIssue]) -> i32 {
    if issues.iter().any(|i| i.severity == Severity::Critical) {
        2
    } else if score < HEALTHY_SCORE || issues.iter().any(|i| i.severity == Severity::High) {
        1
    } else {
        0
    }
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    async fn run_health_check(&self) -> HealthReport;
}

type ToolLocator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Checks tools, permissions, accessibility latency and the model endpoint.
pub struct SystemHealthChecker {
    config: DiagnosticsConfig,
    runner: Arc<dyn ScriptRunner>,
    permissions: Arc<dyn PermissionValidator>,
    accessibility: Arc<dyn AccessibilityDebugger>,
    endpoint: Option<ModelEndpointProbe>,
    locate_tool: ToolLocator,
}

impl SystemHealthChecker {
    pub fn new(
        config: DiagnosticsConfig,
        runner: Arc<dyn ScriptRunner>,
        permissions: Arc<dyn PermissionValidator>,
        accessibility: Arc<dyn AccessibilityDebugger>,
    ) -> Self {
        Self {
            config,
            runner,
            permissions,
            accessibility,
            endpoint: None,
            locate_tool: Arc::new(|tool| which::which(tool).is_ok()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: ModelEndpointProbe) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_tool_locator(mut self, locate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.locate_tool = Arc::new(locate);
        self
    }

    fn check_tools(&self, issues: &mut Vec<HealthIssue>) {
        for tool in &self.config.required_tools {
            if (self.locate_tool)(tool) {
                debug!(tool = %tool, "tool found");
                continue;
            }
            let (severity, remediation) = match tool.as_str() {
                "osascript" => (Severity::Critical, "osascript ships with macOS; AURA cannot run elsewhere"),
                "cliclick" => (Severity::High, "brew install cliclick, or set input.backend to osascript"),
                _ => (Severity::Medium, "Make sure /usr/bin is on PATH"),
            };
            issues.push(
                HealthIssue::new(IssueCategory::Tools, severity, format!("{} not found on PATH", tool))
                    .with_remediation(remediation),
            );
        }
    }

    fn check_permissions(&self, report: &PermissionReport, issues: &mut Vec<HealthIssue>) {
        let remediation = report.recommendations.join("; ");
        for missing in &report.missing {
            let severity = match missing.as_str() {
                ACCESSIBILITY | AUTOMATION => Severity::Critical,
                _ => Severity::Medium,
            };
            let mut issue = HealthIssue::new(
                IssueCategory::Permissions,
                severity,
                format!("{} permission missing", missing),
            );
            if !remediation.is_empty() {
                issue = issue.with_remediation(remediation.clone());
            }
            issues.push(issue);
        }
    }

    async fn benchmark_osascript(&self, issues: &mut Vec<HealthIssue>) -> Benchmark {
        let started = Instant::now();
        let result = self.runner.osascript("return 1").await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let ok = match result {
            Ok(_) if elapsed_ms <= OSASCRIPT_BUDGET_MS => true,
            Ok(_) => {
                issues.push(HealthIssue::new(
                    IssueCategory::Performance,
                    Severity::Low,
                    format!("osascript round trip took {} ms (budget {} ms)", elapsed_ms, OSASCRIPT_BUDGET_MS),
                ));
                false
            }
            Err(e) => {
                issues.push(HealthIssue::new(
                    IssueCategory::Performance,
                    Severity::High,
                    format!("osascript round trip failed: {}", e),
                ));
                false
            }
        };
        Benchmark {
            name: "osascript_round_trip".to_string(),
            elapsed_ms,
            budget_ms: OSASCRIPT_BUDGET_MS,
            ok,
        }
    }

    async fn benchmark_tree(&self, issues: &mut Vec<HealthIssue>) -> Benchmark {
        let app = &self.config.benchmark_app;
        let started = Instant::now();
        let result = self.accessibility.dump_tree(app).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let ok = match result {
            Ok(dump) if dump.element_count == 0 => {
                issues.push(
                    HealthIssue::new(
                        IssueCategory::Accessibility,
                        Severity::Low,
                        format!("{} exposed an empty accessibility tree", app),
                    )
                    .with_remediation(format!("Open a {} window and re-run", app)),
                );
                false
            }
            Ok(_) if elapsed_ms > TREE_BUDGET_MS => {
                issues.push(HealthIssue::new(
                    IssueCategory::Performance,
                    Severity::Medium,
                    format!("{} tree took {} ms (budget {} ms)", app, elapsed_ms, TREE_BUDGET_MS),
                ));
                false
            }
            Ok(_) => true,
            Err(e) => {
                issues.push(HealthIssue::new(
                    IssueCategory::Accessibility,
                    Severity::Medium,
                    format!("could not read the {} accessibility tree: {}", app, e),
                ));
                false
            }
        };
        Benchmark {
            name: format!("tree_dump:{}", app),
            elapsed_ms,
            budget_ms: TREE_BUDGET_MS,
            ok,
        }
    }

    async fn check_model(&self, issues: &mut Vec<HealthIssue>, benchmarks: &mut Vec<Benchmark>) -> Option<EndpointReport> {
        if self.config.skip_model_probe {
            return None;
        }
        let endpoint = self.endpoint.as_ref()?;

        let report = match endpoint.probe().await {
            Ok(report) => report,
            Err(e) => {
                issues.push(
                    HealthIssue::new(
                        IssueCategory::Model,
                        Severity::Medium,
                        format!("model endpoint {} unreachable: {}", endpoint.base_url(), e),
                    )
                    .with_remediation("Start the local model server or set model.base_url"),
                );
                return None;
            }
        };

        if let Some(completion_ms) = report.completion_ms {
            benchmarks.push(Benchmark {
                name: "model_completion".to_string(),
                elapsed_ms: completion_ms,
                budget_ms: COMPLETION_BUDGET_MS,
                ok: report.completion_ok && completion_ms <= COMPLETION_BUDGET_MS,
            });
            if report.completion_ok && completion_ms > COMPLETION_BUDGET_MS {
                issues.push(HealthIssue::new(
                    IssueCategory::Performance,
                    Severity::Low,
                    format!("one-token completion took {} ms", completion_ms),
                ));
            }
        }
        if !report.completion_ok {
            issues.push(HealthIssue::new(
                IssueCategory::Model,
                Severity::Medium,
                format!(
                    "model endpoint cannot complete: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                ),
            ));
        }
        Some(report)
    }
}

#[async_trait]
impl HealthChecker for SystemHealthChecker {
    async fn run_health_check(&self) -> HealthReport {
        let mut issues = Vec::new();
        let mut benchmarks = Vec::new();

        self.check_tools(&mut issues);

        let permissions = self.permissions.check_accessibility_permissions().await;
        self.check_permissions(&permissions, &mut issues);

        benchmarks.push(self.benchmark_osascript(&mut issues).await);
        benchmarks.push(self.benchmark_tree(&mut issues).await);

        let model = self.check_model(&mut issues, &mut benchmarks).await;

        let mut report = HealthReport::new(issues, benchmarks);
        report.permissions = Some(permissions);
        report.model = model;

        info!(
            score = report.score,
            status = ?report.status,
            issues = report.issues.len(),
            "health check finished"
        );
        report
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
