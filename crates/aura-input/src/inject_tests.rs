use super::*;
use crate::clipboard::MemoryClipboard;
use crate::port::{DryRunPort, InputEvent};

fn text(s: &str) -> InputEvent {
    InputEvent::Text {
        text: s.to_string(),
    }
}

fn key(s: &str) -> InputEvent {
    InputEvent::Key {
        chord: s.to_string(),
    }
}

/// Port whose key presses fail, to exercise error paths.
struct BrokenKeys(DryRunPort);

impl InputPort for BrokenKeys {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn type_text(&self, text: &str) -> Result<(), InputError> {
        self.0.type_text(text)
    }

    fn key_press(&self, _chord: &KeyChord) -> Result<(), InputError> {
        Err(InputError::Failed("key injection denied".to_string()))
    }

    fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        self.0.click(x, y)
    }
}

#[test]
fn test_resolve_fixed_strategies() {
    let typed = TextInjector::new(InjectionStrategy::Keystrokes);
    assert_eq!(typed.resolve("a\nb"), InjectionMethod::Keystrokes);

    let pasted = TextInjector::new(InjectionStrategy::ClipboardPaste);
    assert_eq!(pasted.resolve("a"), InjectionMethod::ClipboardPaste);
}

#[test]
fn test_resolve_auto() {
    let injector = TextInjector::new(InjectionStrategy::Auto { paste_threshold: 5 });
    assert_eq!(injector.resolve("short"), InjectionMethod::Keystrokes);
    assert_eq!(injector.resolve("longer"), InjectionMethod::ClipboardPaste);
    assert_eq!(injector.resolve("a\nb"), InjectionMethod::ClipboardPaste);
}

#[test]
fn test_resolve_auto_counts_chars_not_bytes() {
    let injector = TextInjector::new(InjectionStrategy::Auto { paste_threshold: 3 });
    assert_eq!(injector.resolve("äöü"), InjectionMethod::Keystrokes);
}

#[test]
fn test_keystrokes_single_chunk() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::new();
    let report = TextInjector::new(InjectionStrategy::Keystrokes)
        .inject(&port, &clip, "hello")
        .unwrap();

    assert_eq!(report.method, InjectionMethod::Keystrokes);
    assert_eq!(report.chunks, 1);
    assert_eq!(port.events(), vec![text("hello")]);
}

#[test]
fn test_keystrokes_newlines_become_return() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::new();
    let report = TextInjector::new(InjectionStrategy::Keystrokes)
        .inject(&port, &clip, "fn main() {\r\n}\n")
        .unwrap();

    assert_eq!(report.lines, 3);
    assert_eq!(
        port.events(),
        vec![text("fn main() {"), key("return"), text("}"), key("return")]
    );
}

#[test]
fn test_keystrokes_chunking() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::new();
    let report = TextInjector::new(InjectionStrategy::Keystrokes)
        .with_chunking(4, Duration::ZERO)
        .inject(&port, &clip, "abcdefghij")
        .unwrap();

    assert_eq!(report.chunks, 3);
    assert_eq!(port.events(), vec![text("abcd"), text("efgh"), text("ij")]);
}

#[test]
fn test_keystrokes_chunking_respects_char_boundaries() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::new();
    TextInjector::new(InjectionStrategy::Keystrokes)
        .with_chunking(2, Duration::ZERO)
        .inject(&port, &clip, "ééé")
        .unwrap();
    assert_eq!(port.events(), vec![text("éé"), text("é")]);
}

#[test]
fn test_keystrokes_leave_clipboard_alone() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::with_text("user data");
    TextInjector::new(InjectionStrategy::Keystrokes)
        .inject(&port, &clip, "typed")
        .unwrap();
    assert_eq!(clip.get_text().unwrap(), "user data");
}

#[test]
fn test_paste_restores_clipboard() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::with_text("user data");
    let report = TextInjector::new(InjectionStrategy::ClipboardPaste)
        .inject(&port, &clip, "line 1\nline 2")
        .unwrap();

    assert_eq!(report.method, InjectionMethod::ClipboardPaste);
    assert!(report.clipboard_restored);
    assert_eq!(report.chunks, 0);
    assert_eq!(port.events(), vec![key("cmd+v")]);
    assert_eq!(clip.get_text().unwrap(), "user data");
}

#[test]
fn test_paste_without_restore_leaves_text() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::with_text("user data");
    let report = TextInjector::new(InjectionStrategy::ClipboardPaste)
        .with_clipboard_restore(false, Duration::ZERO)
        .inject(&port, &clip, "generated")
        .unwrap();

    assert!(!report.clipboard_restored);
    assert_eq!(clip.get_text().unwrap(), "generated");
}

#[test]
fn test_paste_with_empty_clipboard() {
    let port = DryRunPort::new();
    let clip = MemoryClipboard::new();
    let report = TextInjector::new(InjectionStrategy::ClipboardPaste)
        .inject(&port, &clip, "generated")
        .unwrap();
    assert!(!report.clipboard_restored);
}

#[test]
fn test_paste_failure_still_restores_clipboard() {
    let port = BrokenKeys(DryRunPort::new());
    let clip = MemoryClipboard::with_text("user data");
    let result = TextInjector::new(InjectionStrategy::ClipboardPaste).inject(&port, &clip, "x");

    assert!(matches!(result, Err(InjectionError::Input(_))));
    assert_eq!(clip.get_text().unwrap(), "user data");
}

#[test]
fn test_keystroke_newline_failure_propagates() {
    let port = BrokenKeys(DryRunPort::new());
    let clip = MemoryClipboard::new();
    let result = TextInjector::new(InjectionStrategy::Keystrokes).inject(&port, &clip, "a\nb");
    assert!(result.is_err());
    assert_eq!(port.0.events(), vec![text("a")]);
}

#[test]
fn test_from_config() {
    let config = InjectionConfig {
        strategy: InjectionStrategyKind::Auto,
        paste_threshold: 12,
        chunk_size: 0,
        ..Default::default()
    };
    let injector = TextInjector::from_config(&config);
    assert_eq!(
        injector.strategy(),
        InjectionStrategy::Auto { paste_threshold: 12 }
    );
    assert_eq!(injector.chunk_size, 1);
}
