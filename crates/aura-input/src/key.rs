//! Key and key-chord parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::port::InputError;

/// A single non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Return,
    Tab,
    Space,
    Backspace,
    ForwardDelete,
    Escape,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// F1 through F12.
    Function(u8),
}

/// Modifier keys, named the way macOS names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Command,
    Control,
    Option,
    Shift,
}

/// A key pressed while holding zero or more modifiers, e.g. `cmd+shift+v`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub modifiers: Vec<Modifier>,
    pub key: Key,
}

impl KeyChord {
    pub fn new(key: Key) -> Self {
        Self {
            modifiers: Vec::new(),
            key,
        }
    }

    pub fn with(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
            self.modifiers.sort();
        }
        self
    }

    /// `cmd+v`, the paste shortcut.
    pub fn paste() -> Self {
        Self::new(Key::Char('v')).with(Modifier::Command)
    }

    pub fn is_plain(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl From<Key> for KeyChord {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

impl FromStr for KeyChord {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "+" {
            return Ok(Self::new(Key::Char('+')));
        }

        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((last, mods)) = parts.split_last() else {
            return Err(InputError::InvalidKey(s.to_string()));
        };

        let mut chord = Self::new(parse_key(last)?);
        for m in mods {
            chord = chord.with(parse_modifier(m)?);
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            let name = match m {
                Modifier::Command => "cmd",
                Modifier::Control => "ctrl",
                Modifier::Option => "alt",
                Modifier::Shift => "shift",
            };
            write!(f, "{}+", name)?;
        }
        match self.key {
            Key::Char(c) => write!(f, "{}", c),
            Key::Function(n) => write!(f, "f{}", n),
            other => write!(f, "{}", key_name(other)),
        }
    }
}

fn key_name(key: Key) -> &'static str {
    match key {
        Key::Return => "return",
        Key::Tab => "tab",
        Key::Space => "space",
        Key::Backspace => "backspace",
        Key::ForwardDelete => "delete",
        Key::Escape => "esc",
        Key::Home => "home",
        Key::End => "end",
        Key::PageUp => "pageup",
        Key::PageDown => "pagedown",
        Key::Up => "up",
        Key::Down => "down",
        Key::Left => "left",
        Key::Right => "right",
        Key::Char(_) | Key::Function(_) => "",
    }
}

/// Parse a modifier name.
pub fn parse_modifier(name: &str) -> Result<Modifier, InputError> {
    match name.to_lowercase().as_str() {
        "cmd" | "command" | "meta" | "super" => Ok(Modifier::Command),
        "ctrl" | "control" => Ok(Modifier::Control),
        "alt" | "option" | "opt" => Ok(Modifier::Option),
        "shift" => Ok(Modifier::Shift),
        _ => Err(InputError::InvalidKey(name.to_string())),
    }
}

/// Parse a single key name. Single characters map to [`Key::Char`].
pub fn parse_key(key: &str) -> Result<Key, InputError> {
    let lower = key.to_lowercase();
    let k = match lower.as_str() {
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" | "fwd-delete" => Key::ForwardDelete,
        "escape" | "esc" => Key::Escape,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "page-up" => Key::PageUp,
        "pagedown" | "page-down" => Key::PageDown,
        "up" | "arrow-up" => Key::Up,
        "down" | "arrow-down" => Key::Down,
        "left" | "arrow-left" => Key::Left,
        "right" | "arrow-right" => Key::Right,

        f if f.len() >= 2 && f.starts_with('f') => match f[1..].parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => Key::Function(n),
            _ => return Err(InputError::InvalidKey(key.to_string())),
        },

        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                _ => return Err(InputError::InvalidKey(key.to_string())),
            }
        }
    };

    Ok(k)
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
