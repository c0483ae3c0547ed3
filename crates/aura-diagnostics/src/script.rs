//! Running osascript and friends with a deadline.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ProbeError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
}

impl ScriptOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs for the probes.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ScriptOutput, ProbeError>;

    /// Run and turn a non-zero exit into [`ProbeError::ScriptFailed`].
    async fn run_checked(&self, program: &str, args: &[String]) -> Result<ScriptOutput, ProbeError> {
        let output = self.run(program, args).await?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(ProbeError::ScriptFailed {
                program: program.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Run an AppleScript, one `-e` per line.
    async fn osascript(&self, script: &str) -> Result<ScriptOutput, ProbeError> {
        self.run_checked("osascript", &osascript_args(script)).await
    }
}

pub fn osascript_args(script: &str) -> Vec<String> {
    script
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .flat_map(|l| ["-e".to_string(), l.to_string()])
        .collect()
}

/// [`ScriptRunner`] backed by `tokio::process`.
pub struct TokioScriptRunner {
    timeout: Duration,
}

impl TokioScriptRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ScriptRunner for TokioScriptRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ScriptOutput, ProbeError> {
        let started = Instant::now();
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                program: program.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| ProbeError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(program, code = ?output.status.code(), elapsed_ms, "script finished");

        Ok(ScriptOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed_ms,
        })
    }
}

/// Replays canned output keyed by a substring of the joined command line.
/// Unmatched commands fail to spawn, like a missing binary.
#[derive(Default)]
pub struct CannedScriptRunner {
    replies: Vec<(String, ScriptOutput)>,
    calls: Mutex<Vec<String>>,
}

impl CannedScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first reply whose `pattern` occurs in the command line wins.
    pub fn reply(mut self, pattern: impl Into<String>, output: ScriptOutput) -> Self {
        self.replies.push((pattern.into(), output));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ScriptRunner for CannedScriptRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ScriptOutput, ProbeError> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().push(line.clone());

        self.replies
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| ProbeError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no canned reply"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osascript_args_one_e_per_line() {
        let args = osascript_args("tell application \"Finder\"\n  get name\nend tell\n");
        assert_eq!(
            args,
            vec!["-e", "tell application \"Finder\"", "-e", "get name", "-e", "end tell"]
        );
    }

    #[tokio::test]
    async fn test_canned_runner_matches_substring() {
        let runner = CannedScriptRunner::new()
            .reply("UI elements enabled", ScriptOutput::success("true\n"))
            .reply("osascript", ScriptOutput::failure(1, "boom (-1743)"));

        let out = runner
            .osascript("tell application \"System Events\" to get UI elements enabled")
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "true");

        let err = runner.osascript("return 1").await.unwrap_err();
        assert_eq!(err.applescript_code(), Some(-1743));
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_canned_runner_unmatched_is_spawn_error() {
        let runner = CannedScriptRunner::new();
        let err = runner.run("cliclick", &[]).await.unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_runner_captures_output() {
        let runner = TokioScriptRunner::new(Duration::from_secs(5));
        let out = runner
            .run("sh", &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()])
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_runner_timeout() {
        let runner = TokioScriptRunner::new(Duration::from_millis(50));
        let err = runner
            .run("sleep", &["5".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_tokio_runner_missing_binary() {
        let runner = TokioScriptRunner::new(Duration::from_secs(1));
        let err = runner
            .run("definitely-not-a-real-binary-aura", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }
}
