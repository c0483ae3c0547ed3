//! Text injection strategies.
//!
//! Typing long text keystroke by keystroke is slow and has been seen to
//! drop or reorder characters in some targets; pasting is fast but clobbers
//! the clipboard and depends on the target honouring `cmd+v`. Neither is
//! right everywhere, so the choice is configuration.

use std::thread;
use std::time::{Duration, Instant};

use aura_config::{InjectionConfig, InjectionStrategyKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clipboard::{Clipboard, ClipboardError};
use crate::key::{Key, KeyChord};
use crate::port::{InputError, InputPort};

#[derive(Debug, Error)]
pub enum InjectionError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// How to choose between typing and pasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionStrategy {
    Keystrokes,
    ClipboardPaste,
    /// Paste multi-line text or text longer than the threshold; type the rest.
    Auto { paste_threshold: usize },
}

/// The method actually used for one injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMethod {
    Keystrokes,
    ClipboardPaste,
}

#[derive(Debug, Clone, Serialize)]
pub struct InjectionReport {
    pub method: InjectionMethod,
    pub chars: usize,
    pub lines: usize,
    /// `type_text` calls issued; zero for a paste.
    pub chunks: usize,
    pub clipboard_restored: bool,
    pub elapsed_ms: u64,
}

/// Delivers text to the focused element through an [`InputPort`].
#[derive(Debug, Clone)]
pub struct TextInjector {
    strategy: InjectionStrategy,
    chunk_size: usize,
    chunk_delay: Duration,
    restore_clipboard: bool,
    paste_settle: Duration,
}

impl TextInjector {
    pub fn new(strategy: InjectionStrategy) -> Self {
        Self {
            strategy,
            chunk_size: 40,
            chunk_delay: Duration::ZERO,
            restore_clipboard: true,
            paste_settle: Duration::ZERO,
        }
    }

    pub fn from_config(config: &InjectionConfig) -> Self {
        let strategy = match config.strategy {
            InjectionStrategyKind::Keystrokes => InjectionStrategy::Keystrokes,
            InjectionStrategyKind::Clipboard => InjectionStrategy::ClipboardPaste,
            InjectionStrategyKind::Auto => InjectionStrategy::Auto {
                paste_threshold: config.paste_threshold,
            },
        };
        Self {
            strategy,
            chunk_size: config.chunk_size.max(1),
            chunk_delay: Duration::from_millis(config.chunk_delay_ms),
            restore_clipboard: config.restore_clipboard,
            paste_settle: Duration::from_millis(config.paste_settle_ms),
        }
    }

    pub fn with_strategy(mut self, strategy: InjectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = chunk_delay;
        self
    }

    pub fn with_clipboard_restore(mut self, restore: bool, settle: Duration) -> Self {
        self.restore_clipboard = restore;
        self.paste_settle = settle;
        self
    }

    pub fn strategy(&self) -> InjectionStrategy {
        self.strategy
    }

    /// Which method `text` would be injected with.
    pub fn resolve(&self, text: &str) -> InjectionMethod {
        match self.strategy {
            InjectionStrategy::Keystrokes => InjectionMethod::Keystrokes,
            InjectionStrategy::ClipboardPaste => InjectionMethod::ClipboardPaste,
            InjectionStrategy::Auto { paste_threshold } => {
                if text.contains('\n') || text.chars().count() > paste_threshold {
                    InjectionMethod::ClipboardPaste
                } else {
                    InjectionMethod::Keystrokes
                }
            }
        }
    }

    pub fn inject(
        &self,
        port: &dyn InputPort,
        clipboard: &dyn Clipboard,
        text: &str,
    ) -> Result<InjectionReport, InjectionError> {
        let started = Instant::now();
        let method = self.resolve(text);
        info!(
            backend = port.name(),
            method = ?method,
            chars = text.chars().count(),
            "injecting text"
        );

        let mut report = InjectionReport {
            method,
            chars: text.chars().count(),
            lines: text.split('\n').count(),
            chunks: 0,
            clipboard_restored: false,
            elapsed_ms: 0,
        };

        match method {
            InjectionMethod::Keystrokes => {
                report.chunks = self.type_keystrokes(port, text)?;
            }
            InjectionMethod::ClipboardPaste => {
                report.clipboard_restored = self.paste(port, clipboard, text)?;
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    fn type_keystrokes(&self, port: &dyn InputPort, text: &str) -> Result<usize, InjectionError> {
        let mut chunks = 0;
        let mut first = true;

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                port.key_press(&KeyChord::new(Key::Return))?;
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            let chars: Vec<char> = line.chars().collect();

            for piece in chars.chunks(self.chunk_size) {
                if !first && !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
                first = false;
                let piece: String = piece.iter().collect();
                debug!(len = piece.len(), "typing chunk");
                port.type_text(&piece)?;
                chunks += 1;
            }
        }

        Ok(chunks)
    }

    /// Returns whether the previous clipboard contents were put back.
    fn paste(
        &self,
        port: &dyn InputPort,
        clipboard: &dyn Clipboard,
        text: &str,
    ) -> Result<bool, InjectionError> {
        let previous = if self.restore_clipboard {
            clipboard.get_text().ok()
        } else {
            None
        };

        clipboard.set_text(text)?;
        let pasted = port.key_press(&KeyChord::paste());
        if !self.paste_settle.is_zero() {
            thread::sleep(self.paste_settle);
        }

        let restored = match previous {
            Some(prev) => match clipboard.set_text(&prev) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "failed to restore clipboard");
                    false
                }
            },
            None => false,
        };

        pasted?;
        Ok(restored)
    }
}

#[cfg(test)]
#[path = "inject_tests.rs"]
mod tests;
