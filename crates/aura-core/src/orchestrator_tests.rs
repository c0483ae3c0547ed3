use aura_input::{DryRunPort, InputEvent, MemoryClipboard};

use super::*;
use crate::error::{DeferredError, PlanError};
use crate::planner::ScriptedPlanner;

fn config() -> ExecutionConfig {
    ExecutionConfig {
        command_timeout_ms: 200,
        resume_timeout_ms: 200,
        state_lock_timeout_ms: 200,
        awaiting_expiry_secs: None,
        focus_delay_ms: 0,
    }
}

fn orchestrator_with(config: &ExecutionConfig) -> (Orchestrator, Arc<DryRunPort>, Arc<MemoryClipboard>) {
    let port = Arc::new(DryRunPort::new());
    let clipboard = Arc::new(MemoryClipboard::with_text("user data"));
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(ScriptedPlanner::new()),
        port.clone(),
        clipboard.clone(),
        TextInjector::new(InjectionStrategy::Keystrokes),
    );
    (orchestrator, port, clipboard)
}

fn orchestrator() -> (Orchestrator, Arc<DryRunPort>, Arc<MemoryClipboard>) {
    orchestrator_with(&config())
}

#[test]
fn test_immediate_command_completes() {
    let (orch, port, _) = orchestrator();
    let outcome = orch.run_command("click 3 4 then type hi").unwrap();

    assert!(matches!(outcome, CommandOutcome::Completed { steps: 2, .. }));
    assert_eq!(
        port.events(),
        vec![
            InputEvent::Click { x: 3, y: 4 },
            InputEvent::Text {
                text: "hi".to_string()
            },
        ]
    );
    assert!(orch.gate().is_free());
}

#[test]
fn test_paste_step_uses_clipboard() {
    let (orch, port, clipboard) = orchestrator();
    orch.run_command("paste pasted text").unwrap();

    assert_eq!(
        port.events(),
        vec![InputEvent::Key {
            chord: "cmd+v".to_string()
        }]
    );
    assert_eq!(clipboard.get_text().unwrap(), "user data");
}

#[test]
fn test_deferred_command_waits_for_click() {
    let (orch, port, _) = orchestrator();
    let outcome = orch.run_command("write done").unwrap();

    let CommandOutcome::WaitingForUserAction { execution_id, .. } = outcome else {
        panic!("expected waiting outcome, got {:?}", outcome);
    };
    assert!(port.events().is_empty());
    assert!(orch.gate().is_free());
    assert_eq!(orch.status().unwrap().execution_id(), Some(execution_id));

    let trigger = orch.handle_user_click(UserGesture::click(100, 200)).unwrap();
    assert!(matches!(trigger, TriggerOutcome::Executed { execution_id: id, .. } if id == execution_id));
    assert_eq!(
        port.events(),
        vec![
            InputEvent::Click { x: 100, y: 200 },
            InputEvent::Text {
                text: "done".to_string()
            },
        ]
    );
    assert!(orch.status().unwrap().is_idle());
}

#[test]
fn test_immediate_commands_run_while_awaiting() {
    let (orch, port, _) = orchestrator();
    orch.run_command("write later").unwrap();
    orch.run_command("press return").unwrap();

    assert_eq!(
        port.events(),
        vec![InputEvent::Key {
            chord: "return".to_string()
        }]
    );
    assert!(!orch.status().unwrap().is_idle());
}

#[test]
fn test_second_deferred_command_rejected() {
    let (orch, _, _) = orchestrator();
    let first = orch.run_command("write one").unwrap();

    let err = orch.run_command("write two").unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Deferred(DeferredError::AlreadyPending { pending }) if pending == first.execution_id()
    ));
    assert!(orch.gate().is_free());
}

#[test]
fn test_plan_error_releases_gate() {
    let (orch, _, _) = orchestrator();
    let err = orch.run_command("juggle").unwrap_err();
    assert!(matches!(err, OrchestratorError::Plan(PlanError::UnknownCommand(_))));
    assert!(orch.gate().is_free());
}

#[test]
fn test_command_times_out_on_busy_gate() {
    let (orch, _, _) = orchestrator();
    let _busy = orch.gate().acquire("other", Duration::from_millis(10)).unwrap();
    let err = orch.run_command("type x").unwrap_err();
    assert!(matches!(err, OrchestratorError::Gate(_)));
}

#[test]
fn test_stale_deferred_action_expires() {
    let config = ExecutionConfig {
        awaiting_expiry_secs: Some(0),
        ..config()
    };
    let (orch, _, _) = orchestrator_with(&config);

    orch.run_command("write one").unwrap();
    // Zero expiry clears the previous action before the next command plans.
    let second = orch.run_command("write two").unwrap();
    assert!(second.is_waiting());
}

#[test]
fn test_outcome_json() {
    let (orch, _, _) = orchestrator();
    let waiting = serde_json::to_value(orch.run_command("generate x").unwrap()).unwrap();
    assert_eq!(waiting["status"], "waiting_for_user_action");
    assert!(waiting["execution_id"].is_string());

    orch.deferred().cancel().unwrap();
    let done = serde_json::to_value(orch.run_command("type x").unwrap()).unwrap();
    assert_eq!(done["status"], "completed");
    assert_eq!(done["steps"], 1);
}
