//! AURA - desktop automation harness
//!
//! Entry point for the diagnostics, input and deferred-action commands.

mod adapters;
mod cli;
mod cmd_config;
mod cmd_diagnose;
mod cmd_input;
mod cmd_session;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use aura_config::{ConfigLoader, LoggingConfig};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and optional file output.
///
/// Console output goes to stderr so `--json` output on stdout stays parseable.
/// Log files rotate daily under `log_dir`.
fn init_tracing(
    logging: &LoggingConfig,
    level: &str,
    log_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(true);

    if !logging.file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .init();
        return Ok(());
    }

    std::fs::create_dir_all(log_dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("aura")
        .filename_suffix("log")
        .max_log_files(14)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes on drop; must outlive every log call.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::from(2);
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    if let Err(e) = init_tracing(&config.logging, level, &adapters::log_dir(&config)) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    debug!(config = ?cli.config, "configuration loaded");

    // `config` subcommands report validation themselves.
    if !matches!(cli.command, Commands::Config { .. }) {
        if let Err(errors) = cmd_config::preflight(&config) {
            eprint!("{}", errors);
            eprintln!("Run `aura config check` for details.");
            return ExitCode::from(2);
        }
    }

    let result = match cli.command {
        Commands::Doctor { json } => cmd_diagnose::doctor(&config, json).await,
        Commands::Permissions { json } => cmd_diagnose::permissions(&config, json).await,
        Commands::Tree { app, json } => cmd_diagnose::tree(&config, &app, json).await,
        Commands::Find { app, text, json } => cmd_diagnose::find(&config, &app, &text, json).await,
        Commands::Type {
            text,
            strategy,
            dry_run,
        } => cmd_input::type_text(config, text, strategy, dry_run).await,
        Commands::Key { chord, dry_run } => cmd_input::key(config, chord, dry_run).await,
        Commands::Click { x, y, dry_run } => cmd_input::click(config, x, y, dry_run).await,
        Commands::Run { command, dry_run } => {
            cmd_session::run(config, command.join(" "), dry_run).await
        }
        Commands::Session { dry_run } => cmd_session::session(config, dry_run).await,
        Commands::Demo => cmd_session::demo(config).await,
        Commands::Config { action } => cmd_config::handle(&config, cli.config.as_deref(), action),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
