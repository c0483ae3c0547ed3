//! Wiring from configuration to the input stack and orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use aura_config::Config;
use aura_core::{Orchestrator, ScriptedPlanner};
use aura_input::{
    Clipboard, CommandRunner, DryRunPort, InputPort, MemoryClipboard, ProcessRunner, TextInjector,
    clipboard_from_config, input_port_from_config,
};

/// The `~/.aura` directory.
pub(crate) fn aura_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".aura"))
        .unwrap_or_else(|| PathBuf::from(".aura"))
}

/// Where rolling log files go.
pub(crate) fn log_dir(config: &Config) -> PathBuf {
    config
        .logging
        .dir
        .clone()
        .unwrap_or_else(|| aura_dir().join("logs"))
}

/// Input port and clipboard for this run. Dry runs never touch the desktop.
pub(crate) struct InputStack {
    pub port: Arc<dyn InputPort>,
    pub clipboard: Arc<dyn Clipboard>,
    /// Set for dry runs so recorded events can be printed.
    pub recorder: Option<Arc<DryRunPort>>,
}

pub(crate) fn input_stack(config: &Config, dry_run: bool) -> InputStack {
    if dry_run {
        let recorder = Arc::new(DryRunPort::new());
        return InputStack {
            port: recorder.clone(),
            clipboard: Arc::new(MemoryClipboard::new()),
            recorder: Some(recorder),
        };
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    InputStack {
        port: input_port_from_config(&config.input, runner.clone()),
        clipboard: clipboard_from_config(&config.clipboard, runner),
        recorder: None,
    }
}

pub(crate) fn orchestrator(config: &Config, stack: &InputStack) -> Orchestrator {
    Orchestrator::new(
        &config.execution,
        Arc::new(ScriptedPlanner::new()),
        stack.port.clone(),
        stack.clipboard.clone(),
        TextInjector::from_config(&config.injection),
    )
}
