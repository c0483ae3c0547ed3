//! `aura run`, `session` and `demo`: commands through the orchestrator.

use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use aura_config::{Config, ExecutionConfig};
use aura_core::{CommandOutcome, Orchestrator, OrchestratorError, ScriptedPlanner, TriggerOutcome, UserGesture};
use aura_input::{DryRunPort, InjectionStrategy, InputEvent, MemoryClipboard, TextInjector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::adapters;
use crate::cmd_input::print_recorded;

pub(crate) async fn run(config: Config, command: String, dry_run: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let stack = adapters::input_stack(&config, dry_run);
    let orchestrator = adapters::orchestrator(&config, &stack);

    let outcome = tokio::task::spawn_blocking(move || orchestrator.run_command(&command)).await??;

    print_recorded(&stack)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if outcome.is_waiting() {
        println!("Deferred action is discarded on exit; use `aura session` to trigger it with a click.");
    }
    Ok(0)
}

const SESSION_HELP: &str = "Commands run concurrently. `click X Y` on its own is the user gesture that \
releases the pending action; to click as a command step, chain it (`click X Y then press return`). \
Also: `status`, `cancel`, `quit`.";

/// One line typed into the session console. A bare `click X Y` is always
/// the user gesture, never the planner's click step.
#[derive(Debug, PartialEq, Eq)]
enum SessionLine {
    Empty,
    Quit,
    Status,
    Cancel,
    Click(i32, i32),
    Command(String),
}

impl SessionLine {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => SessionLine::Empty,
            ["quit"] | ["exit"] => SessionLine::Quit,
            ["status"] => SessionLine::Status,
            ["cancel"] => SessionLine::Cancel,
            ["click", x, y] => match (x.parse(), y.parse()) {
                (Ok(x), Ok(y)) => SessionLine::Click(x, y),
                _ => SessionLine::Command(line.to_string()),
            },
            _ => SessionLine::Command(line.to_string()),
        }
    }
}

pub(crate) async fn session(config: Config, dry_run: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let stack = adapters::input_stack(&config, dry_run);
    let orchestrator = Arc::new(adapters::orchestrator(&config, &stack));
    info!(backend = orchestrator.input().name(), "session started");
    println!("{}", SESSION_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        // Reap finished commands so the set does not grow without bound.
        while in_flight.try_join_next().is_some() {}

        match SessionLine::parse(&line) {
            SessionLine::Empty => {}
            SessionLine::Quit => break,
            SessionLine::Status => match orchestrator.status() {
                Ok(status) => println!("{}", serde_json::to_string(&status)?),
                Err(e) => println!("status unavailable: {}", e),
            },
            SessionLine::Cancel => match orchestrator.deferred().cancel() {
                Ok(Some(id)) => println!("[{}] cancelled", id.short()),
                Ok(None) => println!("nothing to cancel"),
                Err(e) => println!("cancel failed: {}", e),
            },
            SessionLine::Click(x, y) => {
                let orchestrator = orchestrator.clone();
                in_flight.spawn_blocking(move || {
                    match orchestrator.handle_user_click(UserGesture::click(x, y)) {
                        Ok(outcome) => println!("{}", describe_trigger(&outcome)),
                        Err(e) => println!("click failed: {}", e),
                    }
                });
            }
            SessionLine::Command(command) => {
                let orchestrator = orchestrator.clone();
                in_flight.spawn_blocking(move || match orchestrator.run_command(&command) {
                    Ok(outcome) => println!("{}", describe_outcome(&outcome)),
                    Err(e) => println!("{:?} failed: {}", command, e),
                });
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "session task panicked");
        }
    }
    if let Ok(status) = orchestrator.status() {
        if !status.is_idle() {
            println!("Discarding pending action {}", serde_json::to_string(&status)?);
        }
    }
    print_recorded(&stack)?;
    Ok(0)
}

fn describe_outcome(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Completed {
            execution_id,
            steps,
            elapsed_ms,
        } => format!("[{}] completed {} step(s) in {}ms", execution_id.short(), steps, elapsed_ms),
        CommandOutcome::WaitingForUserAction {
            execution_id,
            description,
        } => format!("[{}] waiting: {}", execution_id.short(), description),
    }
}

fn describe_trigger(outcome: &TriggerOutcome) -> String {
    match outcome {
        TriggerOutcome::Executed {
            execution_id,
            elapsed_ms,
        } => format!("[{}] executed in {}ms", execution_id.short(), elapsed_ms),
        TriggerOutcome::Duplicate { execution_id } => {
            format!("[{}] already running, click ignored", execution_id.short())
        }
        TriggerOutcome::NothingPending => "no pending action".to_string(),
    }
}

pub(crate) async fn demo(config: Config) -> Result<u8, Box<dyn std::error::Error>> {
    let report = tokio::task::spawn_blocking(move || run_demo(&config.execution)).await??;

    for (at_ms, entry) in &report.timeline {
        println!("{:>6}ms  {}", at_ms, entry);
    }
    println!();
    for (check, passed) in &report.checks {
        println!("[{}] {}", if *passed { "pass" } else { "FAIL" }, check);
    }
    Ok(if report.passed() { 0 } else { 1 })
}

struct DemoReport {
    timeline: Vec<(u64, String)>,
    checks: Vec<(&'static str, bool)>,
}

impl DemoReport {
    fn passed(&self) -> bool {
        self.checks.iter().all(|(_, ok)| *ok)
    }
}

/// Deferred handoff end to end on a recording port: A defers, B completes
/// while A waits, two clicks race to release A.
fn run_demo(execution: &ExecutionConfig) -> Result<DemoReport, OrchestratorError> {
    const A_CONTENT: &str = "fn answer() -> u32 { 42 }";
    const B_TEXT: &str = "hello from B";

    let execution = ExecutionConfig {
        awaiting_expiry_secs: None,
        focus_delay_ms: 0,
        ..execution.clone()
    };
    let port = Arc::new(DryRunPort::new().with_latency(Duration::from_millis(20)));
    let orchestrator = Arc::new(Orchestrator::new(
        &execution,
        Arc::new(ScriptedPlanner::new()),
        port.clone(),
        Arc::new(MemoryClipboard::new()),
        TextInjector::new(InjectionStrategy::Keystrokes),
    ));

    let started = Instant::now();
    let mut timeline = Vec::new();
    let mut checks = Vec::new();
    let mut log = |entry: String| timeline.push((started.elapsed().as_millis() as u64, entry));

    let a = orchestrator.run_command(&format!("generate {}", A_CONTENT))?;
    log(format!("A: {}", describe_outcome(&a)));
    checks.push(("A waits for the user", a.is_waiting()));
    checks.push(("gate is free while A waits", orchestrator.gate().is_free()));

    let b = {
        let orchestrator = orchestrator.clone();
        std::thread::spawn(move || orchestrator.run_command(&format!("type {}", B_TEXT)))
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?
    };
    log(format!("B: {}", describe_outcome(&b)));
    checks.push(("B completes", !b.is_waiting()));
    checks.push((
        "A still waiting after B",
        orchestrator.status()?.execution_id() == Some(a.execution_id()),
    ));

    let barrier = Arc::new(Barrier::new(2));
    let clicks: Vec<_> = (0..2)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                orchestrator.handle_user_click(UserGesture::click(640 + i, 360))
            })
        })
        .collect();
    let mut executed = 0;
    for click in clicks {
        match click.join() {
            Ok(Ok(outcome)) => {
                if matches!(outcome, TriggerOutcome::Executed { .. }) {
                    executed += 1;
                }
                log(format!("click: {}", describe_trigger(&outcome)));
            }
            Ok(Err(e)) => log(format!("click failed: {}", e)),
            Err(_) => log("click thread panicked".to_string()),
        }
    }

    let a_typed = port
        .events()
        .iter()
        .filter(|e| matches!(e, InputEvent::Text { text } if text == A_CONTENT))
        .count();
    checks.push(("exactly one click executes A", executed == 1));
    checks.push(("A's text is typed once", a_typed == 1));
    checks.push(("coordinator back to idle", orchestrator.status()?.is_idle()));
    checks.push(("gate free at the end", orchestrator.gate().is_free()));
    checks.push(("side effects never overlapped", port.peak_in_flight() == 1));
    log(format!("{} input event(s) recorded", port.events().len()));

    Ok(DemoReport { timeline, checks })
}
