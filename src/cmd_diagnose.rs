//! `aura doctor`, `permissions`, `tree` and `find`.

use std::sync::Arc;

use aura_config::Config;
use aura_diagnostics::{
    AccessibilityDebugger, DetectionAnalysis, HealthChecker, HealthReport, OsascriptAccessibilityDebugger,
    PermissionLevel, PermissionReport, PermissionValidator, ScriptRunner, SystemEventsValidator, TokioScriptRunner,
    TreeDump, health_checker_from_config,
};
use serde::Serialize;
use tracing::info;

fn script_runner(config: &Config) -> Arc<dyn ScriptRunner> {
    Arc::new(TokioScriptRunner::new(config.diagnostics.probe_timeout()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn doctor(config: &Config, json: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let checker = health_checker_from_config(config)?;
    let report = checker.run_health_check().await;
    info!(score = report.score, issues = report.issues.len(), "health check finished");

    if json {
        print_json(&report)?;
    } else {
        print!("{}", render_health(&report));
    }
    Ok(report.exit_code() as u8)
}

pub(crate) async fn permissions(config: &Config, json: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let report = SystemEventsValidator::new(script_runner(config))
        .check_accessibility_permissions()
        .await;

    if json {
        print_json(&report)?;
    } else {
        print!("{}", render_permissions(&report));
    }
    Ok(match report.level {
        PermissionLevel::Full => 0,
        PermissionLevel::Partial => 1,
        PermissionLevel::None => 2,
    })
}

pub(crate) async fn tree(config: &Config, app: &str, json: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let dump = OsascriptAccessibilityDebugger::new(script_runner(config))
        .dump_tree(app)
        .await?;

    if json {
        print_json(&dump)?;
    } else {
        print!("{}", render_tree(&dump));
    }
    Ok(0)
}

pub(crate) async fn find(
    config: &Config,
    app: &str,
    text: &str,
    json: bool,
) -> Result<u8, Box<dyn std::error::Error>> {
    let analysis = OsascriptAccessibilityDebugger::new(script_runner(config))
        .analyze_detection_failure(app, text)
        .await?;

    if json {
        print_json(&analysis)?;
    } else {
        print!("{}", render_analysis(&analysis));
    }
    Ok(if analysis.match_count > 0 { 0 } else { 1 })
}

fn render_health(report: &HealthReport) -> String {
    let mut out = format!(
        "Health: {}/100 ({:?})\n",
        report.score, report.status
    );

    if !report.benchmarks.is_empty() {
        out.push_str(&format!("\n{:<20} {:>10} {:>10} {}\n", "BENCHMARK", "ELAPSED", "BUDGET", "OK"));
        out.push_str(&format!("{}\n", "-".repeat(48)));
        for b in &report.benchmarks {
            out.push_str(&format!(
                "{:<20} {:>8}ms {:>8}ms {}\n",
                b.name,
                b.elapsed_ms,
                b.budget_ms,
                if b.ok { "yes" } else { "no" }
            ));
        }
    }

    if report.issues.is_empty() {
        out.push_str("\nNo issues found.\n");
    } else {
        out.push_str(&format!("\n{:<10} {:<15} {}\n", "SEVERITY", "CATEGORY", "ISSUE"));
        out.push_str(&format!("{}\n", "-".repeat(72)));
        for issue in &report.issues {
            out.push_str(&format!(
                "{:<10} {:<15} {}\n",
                issue.severity.to_string(),
                issue.category.to_string(),
                issue.message
            ));
            if let Some(fix) = &issue.remediation {
                out.push_str(&format!("{:<26} -> {}\n", "", fix));
            }
        }
    }

    if let Some(model) = &report.model {
        out.push_str(&format!(
            "\nModel endpoint {}: {} model(s), selected {}\n",
            model.base_url,
            model.models.len(),
            model.selected_model.as_deref().unwrap_or("-")
        ));
    }
    out
}

fn render_permissions(report: &PermissionReport) -> String {
    let mut out = format!("Permission level: {} (trusted: {})\n", report.level, report.trusted);
    for granted in &report.granted {
        out.push_str(&format!("  [ok]      {}\n", granted));
    }
    for missing in &report.missing {
        out.push_str(&format!("  [missing] {}\n", missing));
    }
    for rec in &report.recommendations {
        out.push_str(&format!("  - {}\n", rec));
    }
    out
}

fn render_tree(dump: &TreeDump) -> String {
    let mut out = format!(
        "{}: {} element(s), {} clickable, {}ms\n",
        dump.app,
        dump.element_count,
        dump.clickable.len(),
        dump.generation_ms
    );
    out.push_str(&format!("\n{:<24} {}\n", "ROLE", "COUNT"));
    out.push_str(&format!("{}\n", "-".repeat(32)));
    for (role, count) in &dump.role_counts {
        out.push_str(&format!("{:<24} {}\n", role, count));
    }
    if !dump.clickable.is_empty() {
        out.push_str("\nClickable:\n");
        for element in &dump.clickable {
            out.push_str(&format!("  {:<20} {}\n", element.role, element.title));
        }
    }
    out
}

fn render_analysis(analysis: &DetectionAnalysis) -> String {
    let mut out = format!(
        "Looking for {:?} in {}: {} match(es) among {} element(s)\n",
        analysis.target, analysis.app, analysis.match_count, analysis.element_count
    );
    if let Some(best) = &analysis.best_match {
        out.push_str(&format!(
            "Best match: {} {:?} (score {:.2}, clickable: {})\n",
            best.role, best.title, best.score, best.clickable
        ));
    }
    for rec in &analysis.recommendations {
        out.push_str(&format!("  - {}\n", rec));
    }
    out
}
