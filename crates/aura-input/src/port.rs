//! The input-injection port and its recording implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::key::KeyChord;

/// Input injection errors.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input failed: {0}")]
    Failed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unsupported by {backend}: {what}")]
    Unsupported { backend: &'static str, what: String },
}

/// Synthetic keyboard and mouse injection.
///
/// Every operation is a side effect on the desktop; callers serialize them
/// through the execution gate.
pub trait InputPort: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Type literal text. Newline handling is backend-specific; use
    /// [`crate::TextInjector`] for multi-line text.
    fn type_text(&self, text: &str) -> Result<(), InputError>;

    fn key_press(&self, chord: &KeyChord) -> Result<(), InputError>;

    /// Left click at absolute screen coordinates.
    fn click(&self, x: i32, y: i32) -> Result<(), InputError>;
}

/// One recorded input event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Text { text: String },
    Key { chord: String },
    Click { x: i32, y: i32 },
}

/// Records events instead of touching the desktop.
///
/// Also tracks how many calls overlap, which is how tests observe that
/// side effects never run concurrently.
#[derive(Default)]
pub struct DryRunPort {
    events: Mutex<Vec<InputEvent>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl DryRunPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every event take `latency`, to widen race windows.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// The largest number of calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, event: InputEvent) -> Result<(), InputError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        info!(backend = "dry-run", event = ?event, "input");
        self.events.lock().push(event);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl InputPort for DryRunPort {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn type_text(&self, text: &str) -> Result<(), InputError> {
        self.record(InputEvent::Text {
            text: text.to_string(),
        })
    }

    fn key_press(&self, chord: &KeyChord) -> Result<(), InputError> {
        self.record(InputEvent::Key {
            chord: chord.to_string(),
        })
    }

    fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        self.record(InputEvent::Click { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_dry_run_records_in_order() {
        let port = DryRunPort::new();
        port.click(10, 20).unwrap();
        port.type_text("hello").unwrap();
        port.key_press(&KeyChord::paste()).unwrap();

        assert_eq!(
            port.events(),
            vec![
                InputEvent::Click { x: 10, y: 20 },
                InputEvent::Text {
                    text: "hello".to_string()
                },
                InputEvent::Key {
                    chord: "cmd+v".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_dry_run_clear() {
        let port = DryRunPort::new();
        port.type_text("x").unwrap();
        port.clear();
        assert!(port.events().is_empty());
    }

    #[test]
    fn test_sequential_calls_peak_at_one() {
        let port = DryRunPort::new();
        for _ in 0..5 {
            port.type_text("a").unwrap();
        }
        assert_eq!(port.peak_in_flight(), 1);
    }

    #[test]
    fn test_overlapping_calls_are_observed() {
        let port = Arc::new(DryRunPort::new().with_latency(Duration::from_millis(200)));
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let port = port.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    port.type_text("x").unwrap()
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(port.peak_in_flight(), 2);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&InputEvent::Click { x: 1, y: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"click","x":1,"y":2}"#);
    }

    #[test]
    fn test_command_failed_display() {
        let err = InputError::CommandFailed {
            program: "cliclick".to_string(),
            code: Some(1),
            stderr: "no permission".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("cliclick"));
        assert!(display.contains("no permission"));
    }
}
