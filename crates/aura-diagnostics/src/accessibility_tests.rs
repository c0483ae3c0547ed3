use super::*;
use crate::script::{CannedScriptRunner, ScriptOutput};

const TEXTEDIT: &str = "AXWindow\tUntitled\n\
AXToolbar\t\n\
AXButton\tSave\n\
AXButton\tSave As…\n\
AXTextArea\t\n\
AXStaticText\tUntitled — Edited\n\
AXPopUpButton\tFont\n\
\n\
\tno role\n";

fn elements() -> Vec<ElementSummary> {
    parse_listing(TEXTEDIT)
}

#[test]
fn test_parse_listing() {
    let parsed = elements();
    assert_eq!(parsed.len(), 7);
    assert_eq!(parsed[0], ElementSummary::new("AXWindow", "Untitled"));
    assert_eq!(parsed[1].title, "");
    assert!(parsed[2].clickable);
    assert!(!parsed[4].clickable);
}

#[test]
fn test_summarize() {
    let dump = summarize("TextEdit", &elements(), 42);
    assert_eq!(dump.element_count, 7);
    assert_eq!(dump.role_counts["AXButton"], 2);
    assert_eq!(dump.clickable.len(), 3);
    assert_eq!(dump.generation_ms, 42);
}

#[test]
fn test_score() {
    assert_eq!(score("save", "Save As…"), 1.0);
    assert_eq!(score("", "Save"), 0.0);
    assert_eq!(score("save", ""), 0.0);
    assert!(score("Sve", "Save") > SUGGEST_THRESHOLD);
    assert!(score("Print", "Font") < MATCH_THRESHOLD);
}

#[test]
fn test_analyze_multiple_matches() {
    let analysis = analyze("TextEdit", "Save", &elements());
    assert_eq!(analysis.match_count, 2);
    let best = analysis.best_match.unwrap();
    assert_eq!(best.role, "AXButton");
    assert!(best.clickable);
    assert!(analysis.recommendations.iter().any(|r| r.contains("2 elements match")));
}

#[test]
fn test_analyze_near_miss() {
    let analysis = analyze("TextEdit", "Pont", &elements());
    assert_eq!(analysis.match_count, 0);
    assert_eq!(analysis.best_match.as_ref().unwrap().title, "Font");
    assert!(analysis.recommendations[0].contains("closest element"));
}

#[test]
fn test_analyze_not_clickable() {
    let analysis = analyze("TextEdit", "Edited", &elements());
    assert_eq!(analysis.match_count, 1);
    assert!(analysis.recommendations[0].contains("not clickable"));
}

#[test]
fn test_analyze_absent_target() {
    let analysis = analyze("TextEdit", "zzzzqqq", &elements());
    assert_eq!(analysis.match_count, 0);
    assert!(analysis.recommendations.iter().any(|r| r.contains("vision-based")));
}

#[test]
fn test_analyze_empty_tree() {
    let analysis = analyze("Ghost", "Save", &[]);
    assert_eq!(analysis.element_count, 0);
    assert!(analysis.best_match.is_none());
    assert!(analysis.recommendations[0].contains("Ghost exposed no elements"));
}

#[test]
fn test_listing_script_quotes_app() {
    let script = listing_script(r#"My "App""#);
    assert!(script.contains(r#"tell process "My \"App\"""#));
}

#[tokio::test]
async fn test_dump_tree_via_osascript() {
    let runner = Arc::new(CannedScriptRunner::new().reply("entire contents", ScriptOutput::success(TEXTEDIT)));
    let debugger = OsascriptAccessibilityDebugger::new(runner.clone());

    let dump = debugger.dump_tree("TextEdit").await.unwrap();
    assert_eq!(dump.app, "TextEdit");
    assert_eq!(dump.element_count, 7);
    assert!(runner.calls()[0].contains("tell process \"TextEdit\""));
}

#[tokio::test]
async fn test_dump_tree_propagates_denial() {
    let runner = Arc::new(CannedScriptRunner::new().reply(
        "osascript",
        ScriptOutput::failure(1, "execution error: not allowed assistive access. (-25211)"),
    ));
    let debugger = OsascriptAccessibilityDebugger::new(runner);

    let err = debugger.dump_tree("TextEdit").await.unwrap_err();
    assert_eq!(err.applescript_code(), Some(-25211));
}

#[tokio::test]
async fn test_analyze_via_osascript() {
    let runner = Arc::new(CannedScriptRunner::new().reply("entire contents", ScriptOutput::success(TEXTEDIT)));
    let analysis = OsascriptAccessibilityDebugger::new(runner)
        .analyze_detection_failure("TextEdit", "Font")
        .await
        .unwrap();
    assert_eq!(analysis.match_count, 1);
    assert!(analysis.recommendations.is_empty());
}
