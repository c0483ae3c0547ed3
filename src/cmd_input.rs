//! `aura type`, `key` and `click`: single input actions outside the orchestrator.

use aura_config::{Config, InjectionStrategyKind};
use aura_input::{KeyChord, TextInjector};
use tracing::info;

use crate::adapters::{self, InputStack};
use crate::cli::StrategyArg;

impl From<StrategyArg> for InjectionStrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Keystrokes => InjectionStrategyKind::Keystrokes,
            StrategyArg::Clipboard => InjectionStrategyKind::Clipboard,
            StrategyArg::Auto => InjectionStrategyKind::Auto,
        }
    }
}

/// Print what a dry run would have sent.
pub(crate) fn print_recorded(stack: &InputStack) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(recorder) = &stack.recorder {
        for event in recorder.events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}

pub(crate) async fn type_text(
    mut config: Config,
    text: String,
    strategy: Option<StrategyArg>,
    dry_run: bool,
) -> Result<u8, Box<dyn std::error::Error>> {
    if let Some(strategy) = strategy {
        config.injection.strategy = strategy.into();
    }
    let injector = TextInjector::from_config(&config.injection);
    let stack = adapters::input_stack(&config, dry_run);

    let port = stack.port.clone();
    let clipboard = stack.clipboard.clone();
    let report =
        tokio::task::spawn_blocking(move || injector.inject(port.as_ref(), clipboard.as_ref(), &text)).await??;

    info!(method = ?report.method, chars = report.chars, "text delivered");
    print_recorded(&stack)?;
    println!(
        "Typed {} char(s) via {:?} in {}ms",
        report.chars, report.method, report.elapsed_ms
    );
    Ok(0)
}

pub(crate) async fn key(config: Config, chord: String, dry_run: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let chord: KeyChord = chord.parse()?;
    let stack = adapters::input_stack(&config, dry_run);

    let port = stack.port.clone();
    let pressed = chord.clone();
    tokio::task::spawn_blocking(move || port.key_press(&pressed)).await??;

    print_recorded(&stack)?;
    println!("Pressed {}", chord);
    Ok(0)
}

pub(crate) async fn click(config: Config, x: i32, y: i32, dry_run: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let stack = adapters::input_stack(&config, dry_run);

    let port = stack.port.clone();
    tokio::task::spawn_blocking(move || port.click(x, y)).await??;

    print_recorded(&stack)?;
    println!("Clicked ({}, {})", x, y);
    Ok(0)
}
