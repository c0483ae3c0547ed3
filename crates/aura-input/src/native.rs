//! Native event injection through enigo (macOS only).

use enigo::{Button, Coordinate, Direction, Enigo, Key as EnigoKey, Keyboard, Mouse, Settings};

use crate::key::{Key, KeyChord, Modifier};
use crate::port::{InputError, InputPort};

/// Posts CGEvents directly instead of spawning helpers.
///
/// A fresh connection is opened per call so the port stays `Send + Sync`.
#[derive(Debug, Default)]
pub struct NativePort;

impl NativePort {
    pub fn new() -> Self {
        Self
    }

    fn enigo() -> Result<Enigo, InputError> {
        Enigo::new(&Settings::default()).map_err(|e| InputError::Failed(e.to_string()))
    }
}

fn to_enigo_key(key: Key) -> Result<EnigoKey, InputError> {
    let k = match key {
        Key::Char(c) => EnigoKey::Unicode(c),
        Key::Return => EnigoKey::Return,
        Key::Tab => EnigoKey::Tab,
        Key::Space => EnigoKey::Space,
        Key::Backspace => EnigoKey::Backspace,
        Key::ForwardDelete => EnigoKey::Delete,
        Key::Escape => EnigoKey::Escape,
        Key::Home => EnigoKey::Home,
        Key::End => EnigoKey::End,
        Key::PageUp => EnigoKey::PageUp,
        Key::PageDown => EnigoKey::PageDown,
        Key::Up => EnigoKey::UpArrow,
        Key::Down => EnigoKey::DownArrow,
        Key::Left => EnigoKey::LeftArrow,
        Key::Right => EnigoKey::RightArrow,
        Key::Function(1) => EnigoKey::F1,
        Key::Function(2) => EnigoKey::F2,
        Key::Function(3) => EnigoKey::F3,
        Key::Function(4) => EnigoKey::F4,
        Key::Function(5) => EnigoKey::F5,
        Key::Function(6) => EnigoKey::F6,
        Key::Function(7) => EnigoKey::F7,
        Key::Function(8) => EnigoKey::F8,
        Key::Function(9) => EnigoKey::F9,
        Key::Function(10) => EnigoKey::F10,
        Key::Function(11) => EnigoKey::F11,
        Key::Function(12) => EnigoKey::F12,
        Key::Function(n) => return Err(InputError::InvalidKey(format!("f{}", n))),
    };
    Ok(k)
}

fn modifier_key(modifier: Modifier) -> EnigoKey {
    match modifier {
        Modifier::Command => EnigoKey::Meta,
        Modifier::Control => EnigoKey::Control,
        Modifier::Option => EnigoKey::Alt,
        Modifier::Shift => EnigoKey::Shift,
    }
}

impl InputPort for NativePort {
    fn name(&self) -> &'static str {
        "native"
    }

    fn type_text(&self, text: &str) -> Result<(), InputError> {
        Self::enigo()?
            .text(text)
            .map_err(|e| InputError::Failed(e.to_string()))
    }

    fn key_press(&self, chord: &KeyChord) -> Result<(), InputError> {
        let key = to_enigo_key(chord.key)?;
        let mut enigo = Self::enigo()?;
        let fail = |e: enigo::InputError| InputError::Failed(e.to_string());

        for m in &chord.modifiers {
            enigo.key(modifier_key(*m), Direction::Press).map_err(fail)?;
        }
        let pressed = enigo.key(key, Direction::Click).map_err(fail);
        // Release modifiers even when the key itself failed.
        for m in chord.modifiers.iter().rev() {
            enigo.key(modifier_key(*m), Direction::Release).map_err(fail)?;
        }
        pressed
    }

    fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        let mut enigo = Self::enigo()?;
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| InputError::Failed(e.to_string()))?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| InputError::Failed(e.to_string()))
    }
}
