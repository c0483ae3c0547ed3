//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub injection: InjectionConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timeouts for the execution gate and deferred actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// How long a new command may wait for the execution gate.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// How long a triggered deferred action may wait to re-acquire the gate.
    #[serde(default = "default_resume_timeout_ms")]
    pub resume_timeout_ms: u64,

    /// Bound on acquiring the deferred-state lock.
    #[serde(default = "default_state_lock_timeout_ms")]
    pub state_lock_timeout_ms: u64,

    /// Cancel a pending deferred action after this many seconds. Unset means never.
    #[serde(default)]
    pub awaiting_expiry_secs: Option<u64>,

    /// Pause between clicking the user's target and delivering text.
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,
}

impl ExecutionConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn resume_timeout(&self) -> Duration {
        Duration::from_millis(self.resume_timeout_ms)
    }

    pub fn state_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.state_lock_timeout_ms)
    }

    pub fn awaiting_expiry(&self) -> Option<Duration> {
        self.awaiting_expiry_secs.map(Duration::from_secs)
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            resume_timeout_ms: default_resume_timeout_ms(),
            state_lock_timeout_ms: default_state_lock_timeout_ms(),
            awaiting_expiry_secs: None,
            focus_delay_ms: default_focus_delay_ms(),
        }
    }
}

fn default_command_timeout_ms() -> u64 {
    30_000
}

fn default_resume_timeout_ms() -> u64 {
    5_000
}

fn default_focus_delay_ms() -> u64 {
    100
}

fn default_state_lock_timeout_ms() -> u64 {
    1_000
}

/// Which mechanism delivers synthetic keyboard and mouse events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputBackend {
    #[default]
    Cliclick,
    Osascript,
    Native,
    DryRun,
}

/// Input injection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub backend: InputBackend,

    #[serde(default = "default_cliclick_path")]
    pub cliclick_path: String,

    /// Delay cliclick inserts between its own events.
    #[serde(default = "default_cliclick_wait_ms")]
    pub cliclick_wait_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            backend: InputBackend::default(),
            cliclick_path: default_cliclick_path(),
            cliclick_wait_ms: default_cliclick_wait_ms(),
        }
    }
}

fn default_cliclick_path() -> String {
    "cliclick".to_string()
}

fn default_cliclick_wait_ms() -> u64 {
    20
}

/// How generated text reaches the target application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectionStrategyKind {
    Keystrokes,
    Clipboard,
    #[default]
    Auto,
}

/// Text injection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionConfig {
    #[serde(default)]
    pub strategy: InjectionStrategyKind,

    /// Under `auto`, texts longer than this are pasted.
    #[serde(default = "default_paste_threshold")]
    pub paste_threshold: usize,

    /// Characters per keystroke batch.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    #[serde(default = "default_true")]
    pub restore_clipboard: bool,

    /// Time to let the target consume a paste before restoring the clipboard.
    #[serde(default = "default_paste_settle_ms")]
    pub paste_settle_ms: u64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            strategy: InjectionStrategyKind::default(),
            paste_threshold: default_paste_threshold(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            restore_clipboard: true,
            paste_settle_ms: default_paste_settle_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_paste_threshold() -> usize {
    200
}

fn default_chunk_size() -> usize {
    40
}

fn default_chunk_delay_ms() -> u64 {
    15
}

fn default_paste_settle_ms() -> u64 {
    150
}

/// Clipboard access mechanism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipboardBackend {
    #[default]
    Pasteboard,
    System,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipboardConfig {
    #[serde(default)]
    pub backend: ClipboardBackend,
}

/// Local model-serving endpoint (OpenAI chat-completions shaped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ModelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model_base_url() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Diagnostic probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Application whose tree is dumped for the latency benchmark.
    #[serde(default = "default_benchmark_app")]
    pub benchmark_app: String,

    #[serde(default = "default_required_tools")]
    pub required_tools: Vec<String>,

    /// Skip the model endpoint probe entirely.
    #[serde(default)]
    pub skip_model_probe: bool,
}

impl DiagnosticsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            benchmark_app: default_benchmark_app(),
            required_tools: default_required_tools(),
            skip_model_probe: false,
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

fn default_benchmark_app() -> String {
    "Finder".to_string()
}

fn default_required_tools() -> Vec<String> {
    ["osascript", "cliclick", "pbcopy", "pbpaste"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files. Defaults to `~/.aura/logs`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            file: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
