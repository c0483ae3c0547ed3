//! Input injection for AURA.
//!
//! Everything that touches the desktop goes through the [`InputPort`] trait:
//!
//! ## Backends
//! - [`CliclickPort`] - shells out to `cliclick`
//! - [`OsascriptPort`] - System Events via `osascript`
//! - `NativePort` - CGEvents through enigo (macOS only)
//! - [`DryRunPort`] - records events, touches nothing
//!
//! ## Clipboard
//! - [`PasteboardClipboard`] - `pbcopy` / `pbpaste`
//! - [`SystemClipboard`] - arboard
//! - [`MemoryClipboard`] - in-process
//!
//! ## Text
//! - [`TextInjector`] - keystroke or clipboard-paste delivery of text

mod cliclick;
mod clipboard;
mod inject;
mod key;
#[cfg(target_os = "macos")]
mod native;
mod osascript;
mod port;
mod process;

use std::sync::Arc;

use aura_config::{ClipboardBackend, ClipboardConfig, InputBackend, InputConfig};

pub use cliclick::CliclickPort;
pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard, PasteboardClipboard, SystemClipboard};
pub use inject::{InjectionError, InjectionMethod, InjectionReport, InjectionStrategy, TextInjector};
pub use key::{parse_key, parse_modifier, Key, KeyChord, Modifier};
#[cfg(target_os = "macos")]
pub use native::NativePort;
pub use osascript::{applescript_string, OsascriptPort};
pub use port::{DryRunPort, InputError, InputEvent, InputPort};
pub use process::{CommandRunner, ProcessOutput, ProcessRunner, RecordedCall, RecordingRunner};

/// Build the configured input port.
pub fn input_port_from_config(
    config: &InputConfig,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn InputPort> {
    match config.backend {
        InputBackend::Cliclick => Arc::new(
            CliclickPort::new(config.cliclick_path.clone(), runner)
                .with_wait_ms(config.cliclick_wait_ms),
        ),
        InputBackend::Osascript => Arc::new(OsascriptPort::new(runner)),
        InputBackend::Native => native_port(),
        InputBackend::DryRun => Arc::new(DryRunPort::new()),
    }
}

#[cfg(target_os = "macos")]
fn native_port() -> Arc<dyn InputPort> {
    Arc::new(NativePort::new())
}

#[cfg(not(target_os = "macos"))]
fn native_port() -> Arc<dyn InputPort> {
    tracing::warn!("native input backend requires macOS; falling back to dry-run");
    Arc::new(DryRunPort::new())
}

/// Build the configured clipboard.
pub fn clipboard_from_config(
    config: &ClipboardConfig,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn Clipboard> {
    match config.backend {
        ClipboardBackend::Pasteboard => Arc::new(PasteboardClipboard::new(runner)),
        ClipboardBackend::System => Arc::new(SystemClipboard::new()),
        ClipboardBackend::Memory => Arc::new(MemoryClipboard::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_from_config_names() {
        let runner: Arc<dyn CommandRunner> = Arc::new(RecordingRunner::new());
        for (backend, name) in [
            (InputBackend::Cliclick, "cliclick"),
            (InputBackend::Osascript, "osascript"),
            (InputBackend::DryRun, "dry-run"),
        ] {
            let config = InputConfig {
                backend,
                ..Default::default()
            };
            assert_eq!(input_port_from_config(&config, runner.clone()).name(), name);
        }
    }

    #[test]
    fn test_cliclick_path_from_config() {
        let runner = Arc::new(RecordingRunner::new());
        let config = InputConfig {
            backend: InputBackend::Cliclick,
            cliclick_path: "/usr/local/bin/cliclick".to_string(),
            cliclick_wait_ms: 5,
        };
        let port = input_port_from_config(&config, runner.clone());
        port.click(1, 2).unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].program, "/usr/local/bin/cliclick");
        assert_eq!(calls[0].args, vec!["-w", "5", "c:1,2"]);
    }

    #[test]
    fn test_memory_clipboard_from_config() {
        let runner: Arc<dyn CommandRunner> = Arc::new(RecordingRunner::new());
        let config = ClipboardConfig {
            backend: ClipboardBackend::Memory,
        };
        let clip = clipboard_from_config(&config, runner);
        clip.set_text("x").unwrap();
        assert_eq!(clip.get_text().unwrap(), "x");
    }
}
