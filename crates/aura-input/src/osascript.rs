//! AppleScript (System Events) backend.

use std::sync::Arc;

use tracing::debug;

use crate::key::{Key, KeyChord, Modifier};
use crate::port::{InputError, InputPort};
use crate::process::CommandRunner;

/// Injects events through `osascript` and System Events.
pub struct OsascriptPort {
    runner: Arc<dyn CommandRunner>,
}

impl OsascriptPort {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn exec(&self, body: &str) -> Result<(), InputError> {
        let script = format!("tell application \"System Events\" to {}", body);
        debug!(%script, "osascript");
        self.runner
            .run("osascript", &["-e".to_string(), script], None)?
            .into_result("osascript")
            .map(|_| ())
    }
}

/// Quote `text` as an AppleScript string expression.
///
/// Newlines and tabs become `return` and `tab` constants concatenated in.
pub fn applescript_string(text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, parts: &mut Vec<String>| {
        if !current.is_empty() {
            parts.push(format!("\"{}\"", current));
            current.clear();
        }
    };

    for c in text.chars() {
        match c {
            '\\' => current.push_str("\\\\"),
            '"' => current.push_str("\\\""),
            '\n' => {
                flush(&mut current, &mut parts);
                parts.push("return".to_string());
            }
            '\t' => {
                flush(&mut current, &mut parts);
                parts.push("tab".to_string());
            }
            other => current.push(other),
        }
    }
    flush(&mut current, &mut parts);

    if parts.is_empty() {
        "\"\"".to_string()
    } else {
        parts.join(" & ")
    }
}

/// macOS virtual key code for named keys.
fn key_code(key: Key) -> Option<u16> {
    let code = match key {
        Key::Return => 36,
        Key::Tab => 48,
        Key::Space => 49,
        Key::Backspace => 51,
        Key::Escape => 53,
        Key::ForwardDelete => 117,
        Key::Home => 115,
        Key::End => 119,
        Key::PageUp => 116,
        Key::PageDown => 121,
        Key::Left => 123,
        Key::Right => 124,
        Key::Down => 125,
        Key::Up => 126,
        Key::Function(n) => match n {
            1 => 122,
            2 => 120,
            3 => 99,
            4 => 118,
            5 => 96,
            6 => 97,
            7 => 98,
            8 => 100,
            9 => 101,
            10 => 109,
            11 => 103,
            12 => 111,
            _ => return None,
        },
        Key::Char(_) => return None,
    };
    Some(code)
}

/// The System Events statement that presses a chord.
pub(crate) fn chord_statement(chord: &KeyChord) -> Result<String, InputError> {
    let press = match chord.key {
        Key::Char(c) => format!("keystroke {}", applescript_string(&c.to_string())),
        other => match key_code(other) {
            Some(code) => format!("key code {}", code),
            None => return Err(InputError::InvalidKey(chord.to_string())),
        },
    };

    if chord.is_plain() {
        return Ok(press);
    }

    let mods = chord
        .modifiers
        .iter()
        .map(|m| match m {
            Modifier::Command => "command down",
            Modifier::Control => "control down",
            Modifier::Option => "option down",
            Modifier::Shift => "shift down",
        })
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("{} using {{{}}}", press, mods))
}

impl InputPort for OsascriptPort {
    fn name(&self) -> &'static str {
        "osascript"
    }

    fn type_text(&self, text: &str) -> Result<(), InputError> {
        if text.is_empty() {
            return Ok(());
        }
        self.exec(&format!("keystroke {}", applescript_string(text)))
    }

    fn key_press(&self, chord: &KeyChord) -> Result<(), InputError> {
        self.exec(&chord_statement(chord)?)
    }

    fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        self.exec(&format!("click at {{{}, {}}}", x, y))
    }
}
