//! Probe errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} failed (exit {code:?}): {stderr}")]
    ScriptFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ProbeError {
    /// AppleScript error number from an osascript failure, e.g. `-1743`.
    pub fn applescript_code(&self) -> Option<i32> {
        let ProbeError::ScriptFailed { stderr, .. } = self else {
            return None;
        };
        // osascript reports "... execution error: <message> (-1743)"
        let open = stderr.rfind('(')?;
        let close = open + stderr[open..].find(')')?;
        stderr[open + 1..close].trim().parse().ok()
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        ProbeError::Http(e.to_string())
    }
}
