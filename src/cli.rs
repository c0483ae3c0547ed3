//! CLI definitions for AURA.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// AURA CLI.
#[derive(Parser)]
#[command(name = "aura")]
#[command(about = "Desktop input automation with user-gated deferred actions")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.aura/config.toml)
    #[arg(short, long, global = true, env = "AURA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overriding the configured one
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the full health check
    Doctor {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check accessibility and automation permissions
    Permissions {
        #[arg(long)]
        json: bool,
    },

    /// Dump the accessibility tree of an app's front window
    Tree {
        /// Application process name, e.g. "TextEdit"
        app: String,

        #[arg(long)]
        json: bool,
    },

    /// Explain why a text target is or is not found in an app
    Find {
        app: String,

        /// Text of the element to look for
        text: String,

        #[arg(long)]
        json: bool,
    },

    /// Type text into the focused element
    Type {
        text: String,

        /// How to deliver the text (default: from config)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Record events instead of injecting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Press a key chord, e.g. cmd+shift+t
    Key {
        chord: String,

        #[arg(long)]
        dry_run: bool,
    },

    /// Click at screen coordinates
    Click {
        #[arg(allow_negative_numbers = true)]
        x: i32,

        #[arg(allow_negative_numbers = true)]
        y: i32,

        #[arg(long)]
        dry_run: bool,
    },

    /// Run one orchestrated command, e.g. "click 10 10 then type hi"
    Run {
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Interactive console: one thread per command, `click X Y` releases a deferred action
    Session {
        #[arg(long)]
        dry_run: bool,
    },

    /// Replay the deferred-handoff scenario against the dry-run port
    Demo,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Validate the configuration
    Check,

    /// Print the effective configuration as TOML
    Show,

    /// Print the default configuration path
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StrategyArg {
    Keystrokes,
    Clipboard,
    Auto,
}
