//! `cliclick` backend.

use std::sync::Arc;

use tracing::debug;

use crate::key::{Key, KeyChord, Modifier};
use crate::port::{InputError, InputPort};
use crate::process::CommandRunner;

/// Injects events by shelling out to `cliclick`.
pub struct CliclickPort {
    binary: String,
    wait_ms: u64,
    runner: Arc<dyn CommandRunner>,
}

impl CliclickPort {
    pub fn new(binary: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            binary: binary.into(),
            wait_ms: 20,
            runner,
        }
    }

    /// Delay cliclick inserts between events (`-w`).
    pub fn with_wait_ms(mut self, wait_ms: u64) -> Self {
        self.wait_ms = wait_ms;
        self
    }

    fn exec(&self, commands: Vec<String>) -> Result<(), InputError> {
        let mut args = vec!["-w".to_string(), self.wait_ms.to_string()];
        args.extend(commands);
        debug!(binary = %self.binary, ?args, "cliclick");
        self.runner
            .run(&self.binary, &args, None)?
            .into_result(&self.binary)
            .map(|_| ())
    }
}

/// The cliclick command that presses `key` once.
fn press_command(key: Key) -> String {
    let name = match key {
        Key::Char(c) => return format!("t:{}", c),
        Key::Function(n) => return format!("kp:f{}", n),
        Key::Return => "return",
        Key::Tab => "tab",
        Key::Space => "space",
        // macOS "delete" is backspace.
        Key::Backspace => "delete",
        Key::ForwardDelete => "fwd-delete",
        Key::Escape => "esc",
        Key::Home => "home",
        Key::End => "end",
        Key::PageUp => "page-up",
        Key::PageDown => "page-down",
        Key::Up => "arrow-up",
        Key::Down => "arrow-down",
        Key::Left => "arrow-left",
        Key::Right => "arrow-right",
    };
    format!("kp:{}", name)
}

fn modifier_name(modifier: Modifier) -> &'static str {
    match modifier {
        Modifier::Command => "cmd",
        Modifier::Control => "ctrl",
        Modifier::Option => "alt",
        Modifier::Shift => "shift",
    }
}

/// Build the cliclick command list for a chord.
pub(crate) fn chord_commands(chord: &KeyChord) -> Vec<String> {
    let press = press_command(chord.key);

    if chord.is_plain() {
        return vec![press];
    }

    let mods = chord
        .modifiers
        .iter()
        .map(|m| modifier_name(*m))
        .collect::<Vec<_>>()
        .join(",");

    vec![format!("kd:{}", mods), press, format!("ku:{}", mods)]
}

impl InputPort for CliclickPort {
    fn name(&self) -> &'static str {
        "cliclick"
    }

    fn type_text(&self, text: &str) -> Result<(), InputError> {
        if text.is_empty() {
            return Ok(());
        }
        if text.contains('\n') {
            return Err(InputError::Unsupported {
                backend: "cliclick",
                what: "newlines in t: commands; send a return key press instead".to_string(),
            });
        }
        self.exec(vec![format!("t:{}", text)])
    }

    fn key_press(&self, chord: &KeyChord) -> Result<(), InputError> {
        self.exec(chord_commands(chord))
    }

    fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        // Negative coordinates need cliclick's `=` prefix.
        let coord = |v: i32| if v < 0 { format!("={}", v) } else { v.to_string() };
        self.exec(vec![format!("c:{},{}", coord(x), coord(y))])
    }
}
