//! Clipboard operations.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::process::CommandRunner;

/// Clipboard errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard access failed: {0}")]
    AccessFailed(String),

    #[error("No text in clipboard")]
    NoText,
}

/// Text clipboard access.
pub trait Clipboard: Send + Sync {
    fn get_text(&self) -> Result<String, ClipboardError>;

    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// `pbcopy` / `pbpaste`.
pub struct PasteboardClipboard {
    runner: Arc<dyn CommandRunner>,
}

impl PasteboardClipboard {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Clipboard for PasteboardClipboard {
    fn get_text(&self) -> Result<String, ClipboardError> {
        let out = self
            .runner
            .run("pbpaste", &[], None)
            .and_then(|o| o.into_result("pbpaste"))
            .map_err(|e| ClipboardError::AccessFailed(e.to_string()))?;
        Ok(out.stdout)
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.runner
            .run("pbcopy", &[], Some(text))
            .and_then(|o| o.into_result("pbcopy"))
            .map(|_| ())
            .map_err(|e| ClipboardError::AccessFailed(e.to_string()))
    }
}

/// The platform clipboard through arboard.
///
/// arboard handles are not `Sync`, so one is opened per call.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open() -> Result<arboard::Clipboard, ClipboardError> {
        arboard::Clipboard::new().map_err(|e| ClipboardError::AccessFailed(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&self) -> Result<String, ClipboardError> {
        Self::open()?.get_text().map_err(|e| match e {
            arboard::Error::ContentNotAvailable => ClipboardError::NoText,
            other => ClipboardError::AccessFailed(other.to_string()),
        })
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        Self::open()?
            .set_text(text)
            .map_err(|e| ClipboardError::AccessFailed(e.to_string()))
    }
}

/// In-process clipboard for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&self) -> Result<String, ClipboardError> {
        self.text.lock().clone().ok_or(ClipboardError::NoText)
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.text.lock() = Some(text.to_string());
        Ok(())
    }
}
