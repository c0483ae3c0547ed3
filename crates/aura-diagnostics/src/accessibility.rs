//! Accessibility-tree inspection.
//!
//! The tree is read as a flat `role<TAB>title` listing of every element in
//! the app's front window. Element detection by text is what the fast path
//! depends on, so [`AccessibilityDebugger::analyze_detection_failure`]
//! explains why a target text was not found.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use aura_input::applescript_string;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ProbeError;
use crate::script::ScriptRunner;

/// Roles that respond to a click.
pub const CLICKABLE_ROLES: &[&str] = &[
    "AXButton",
    "AXLink",
    "AXMenuItem",
    "AXMenuButton",
    "AXCheckBox",
    "AXRadioButton",
    "AXPopUpButton",
    "AXTab",
];

/// Similarity at or above which a title counts as a match.
pub const MATCH_THRESHOLD: f64 = 0.85;
/// Similarity at or above which a near miss is worth suggesting.
pub const SUGGEST_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub role: String,
    pub title: String,
    pub clickable: bool,
}

impl ElementSummary {
    pub fn new(role: impl Into<String>, title: impl Into<String>) -> Self {
        let role = role.into();
        let clickable = CLICKABLE_ROLES.contains(&role.as_str());
        Self {
            role,
            title: title.into(),
            clickable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDump {
    pub app: String,
    pub element_count: usize,
    pub role_counts: BTreeMap<String, usize>,
    pub clickable: Vec<ElementSummary>,
    pub generation_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementMatch {
    pub role: String,
    pub title: String,
    pub score: f64,
    pub clickable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionAnalysis {
    pub app: String,
    pub target: String,
    pub element_count: usize,
    pub match_count: usize,
    pub best_match: Option<ElementMatch>,
    pub recommendations: Vec<String>,
}

#[async_trait]
pub trait AccessibilityDebugger: Send + Sync {
    async fn dump_tree(&self, app: &str) -> Result<TreeDump, ProbeError>;

    async fn analyze_detection_failure(&self, app: &str, target: &str) -> Result<DetectionAnalysis, ProbeError>;
}

/// Reads the tree through System Events.
pub struct OsascriptAccessibilityDebugger {
    runner: Arc<dyn ScriptRunner>,
}

impl OsascriptAccessibilityDebugger {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    async fn list_elements(&self, app: &str) -> Result<(Vec<ElementSummary>, u64), ProbeError> {
        let started = Instant::now();
        let output = self.runner.osascript(&listing_script(app)).await?;
        let elements = parse_listing(&output.stdout);
        Ok((elements, started.elapsed().as_millis() as u64))
    }
}

#[async_trait]
impl AccessibilityDebugger for OsascriptAccessibilityDebugger {
    async fn dump_tree(&self, app: &str) -> Result<TreeDump, ProbeError> {
        let (elements, generation_ms) = self.list_elements(app).await?;
        let dump = summarize(app, &elements, generation_ms);
        info!(
            app,
            elements = dump.element_count,
            clickable = dump.clickable.len(),
            generation_ms,
            "accessibility tree dumped"
        );
        Ok(dump)
    }

    async fn analyze_detection_failure(&self, app: &str, target: &str) -> Result<DetectionAnalysis, ProbeError> {
        let (elements, _) = self.list_elements(app).await?;
        Ok(analyze(app, target, &elements))
    }
}

fn listing_script(app: &str) -> String {
    format!(
        r#"
        tell application "System Events"
            tell process {app}
                set out to ""
                repeat with e in (entire contents of front window)
                    set r to ""
                    set t to ""
                    try
                        set r to role of e
                    end try
                    try
                        set t to title of e
                        if t is missing value then set t to ""
                    end try
                    if t is "" then
                        try
                            set t to description of e
                            if t is missing value then set t to ""
                        end try
                    end if
                    set out to out & r & tab & t & linefeed
                end repeat
                return out
            end tell
        end tell
        "#,
        app = applescript_string(app)
    )
}

/// Parse `role<TAB>title` lines. Lines without a role are skipped.
pub fn parse_listing(listing: &str) -> Vec<ElementSummary> {
    listing
        .lines()
        .filter_map(|line| {
            let (role, title) = line.split_once('\t').unwrap_or((line, ""));
            let role = role.trim();
            (!role.is_empty()).then(|| ElementSummary::new(role, title.trim()))
        })
        .collect()
}

pub fn summarize(app: &str, elements: &[ElementSummary], generation_ms: u64) -> TreeDump {
    let mut role_counts = BTreeMap::new();
    for element in elements {
        *role_counts.entry(element.role.clone()).or_insert(0) += 1;
    }
    TreeDump {
        app: app.to_string(),
        element_count: elements.len(),
        role_counts,
        clickable: elements.iter().filter(|e| e.clickable).cloned().collect(),
        generation_ms,
    }
}

/// Case-insensitive similarity of `target` to `title`; containment scores 1.0.
pub fn score(target: &str, title: &str) -> f64 {
    let target = target.trim().to_lowercase();
    let title = title.trim().to_lowercase();
    if target.is_empty() || title.is_empty() {
        return 0.0;
    }
    if title.contains(&target) {
        return 1.0;
    }
    strsim::jaro_winkler(&target, &title)
}

pub fn analyze(app: &str, target: &str, elements: &[ElementSummary]) -> DetectionAnalysis {
    let scored: Vec<(f64, &ElementSummary)> = elements.iter().map(|e| (score(target, &e.title), e)).collect();

    let match_count = scored.iter().filter(|(s, _)| *s >= MATCH_THRESHOLD).count();
    // Prefer clickable elements on equal scores.
    let best = scored
        .iter()
        .filter(|(s, _)| *s > 0.0)
        .max_by(|(a, ea), (b, eb)| a.total_cmp(b).then(ea.clickable.cmp(&eb.clickable)))
        .map(|(s, e)| ElementMatch {
            role: e.role.clone(),
            title: e.title.clone(),
            score: *s,
            clickable: e.clickable,
        });

    let mut recommendations = Vec::new();
    if elements.is_empty() {
        recommendations.push(format!(
            "{} exposed no elements; make sure it has a front window and accessibility is granted",
            app
        ));
    } else {
        match &best {
            Some(m) if match_count == 0 && m.score >= SUGGEST_THRESHOLD => recommendations.push(format!(
                "No exact match; the closest element is {} \"{}\" ({:.2}), try that text",
                m.role, m.title, m.score
            )),
            Some(m) if match_count > 0 && !m.clickable => recommendations.push(format!(
                "Best match is a {}, which is not clickable; target its enclosing control instead",
                m.role
            )),
            None | Some(_) if match_count == 0 => recommendations.push(
                "Target text is not in the accessibility tree; the element may be custom-drawn and need vision-based detection"
                    .to_string(),
            ),
            _ => {}
        }
        if match_count > 1 {
            recommendations.push(format!(
                "{} elements match; qualify the target by role or position",
                match_count
            ));
        }
    }

    DetectionAnalysis {
        app: app.to_string(),
        target: target.to_string(),
        element_count: elements.len(),
        match_count,
        best_match: best,
        recommendations,
    }
}

#[cfg(test)]
#[path = "accessibility_tests.rs"]
mod tests;
