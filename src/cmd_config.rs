//! `aura config` subcommands.

use std::path::Path;

use aura_config::{Config, ConfigLoader, ConfigValidator, ValidationResult};
use tracing::warn;

use crate::cli::ConfigAction;

pub(crate) fn handle(
    config: &Config,
    explicit: Option<&Path>,
    action: ConfigAction,
) -> Result<u8, Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Check => {
            let result = ConfigValidator::validate(config);
            print!("{}", render_validation(&result));
            Ok(if result.is_valid() { 0 } else { 1 })
        }
        ConfigAction::Show => {
            println!("{}", render_config(config)?);
            Ok(0)
        }
        ConfigAction::Path => {
            match explicit.map(Path::to_path_buf).or_else(ConfigLoader::default_path) {
                Some(path) => {
                    let note = if path.exists() { "" } else { " (not found, using defaults)" };
                    println!("{}{}", path.display(), note);
                }
                None => println!("no home directory; using defaults"),
            }
            Ok(0)
        }
    }
}

/// Validate before any other command runs. Warnings are logged; errors
/// come back rendered for the user.
pub(crate) fn preflight(config: &Config) -> Result<(), String> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if result.is_valid() {
        Ok(())
    } else {
        Err(render_validation(&result))
    }
}

fn render_validation(result: &ValidationResult) -> String {
    let mut out = String::new();
    for error in &result.errors {
        out.push_str(&format!("error   {}: {}\n", error.path, error.message));
    }
    for warning in &result.warnings {
        out.push_str(&format!("warning {}: {}\n", warning.path, warning.message));
    }
    if result.is_valid() {
        out.push_str(&format!(
            "Configuration OK ({} warning(s))\n",
            result.warnings.len()
        ));
    } else {
        out.push_str(&format!(
            "Configuration invalid: {} error(s)\n",
            result.errors.len()
        ));
    }
    out
}

/// Effective configuration as TOML, with the API key masked.
fn render_config(config: &Config) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.model.api_key.is_some() {
        shown.model.api_key = Some("********".to_string());
    }
    toml::to_string_pretty(&shown)
}
