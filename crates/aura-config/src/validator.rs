//! Configuration validation.

use crate::schema::{Config, InjectionStrategyKind, InputBackend};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_execution(config, &mut result);
        Self::validate_input(config, &mut result);
        Self::validate_injection(config, &mut result);
        Self::validate_model(config, &mut result);
        Self::validate_diagnostics(config, &mut result);

        result
    }

    fn validate_execution(config: &Config, result: &mut ValidationResult) {
        let execution = &config.execution;

        for (path, value) in [
            ("execution.command_timeout_ms", execution.command_timeout_ms),
            ("execution.resume_timeout_ms", execution.resume_timeout_ms),
            ("execution.state_lock_timeout_ms", execution.state_lock_timeout_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(
                    path,
                    "timeouts must be greater than 0; unbounded waits are not allowed",
                ));
            }
        }

        if execution.resume_timeout_ms > execution.command_timeout_ms {
            result.add_warning(ValidationWarning::new(
                "execution.resume_timeout_ms",
                "resume timeout exceeds command timeout; a stuck command will delay the user's click longer than any new command",
            ));
        }

        if execution.awaiting_expiry_secs == Some(0) {
            result.add_error(ValidationError::new(
                "execution.awaiting_expiry_secs",
                "expiry of 0 would cancel every deferred action immediately; omit the key to disable expiry",
            ));
        }
    }

    fn validate_input(config: &Config, result: &mut ValidationResult) {
        if config.input.backend == InputBackend::Cliclick && config.input.cliclick_path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "input.cliclick_path",
                "cliclick path cannot be empty when the cliclick backend is selected",
            ));
        }

        if config.input.backend == InputBackend::Native && !cfg!(target_os = "macos") {
            result.add_warning(ValidationWarning::new(
                "input.backend",
                "the native backend is only available on macOS; dry-run will be used",
            ));
        }
    }

    fn validate_injection(config: &Config, result: &mut ValidationResult) {
        let injection = &config.injection;

        if injection.chunk_size == 0 {
            result.add_error(ValidationError::new(
                "injection.chunk_size",
                "chunk_size must be greater than 0",
            ));
        }

        if injection.strategy == InjectionStrategyKind::Auto
            && injection.paste_threshold < injection.chunk_size
        {
            result.add_warning(ValidationWarning::new(
                "injection.paste_threshold",
                "paste_threshold is below chunk_size; nearly every text will be pasted",
            ));
        }

        if injection.restore_clipboard && injection.paste_settle_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "injection.paste_settle_ms",
                "restoring the clipboard without a settle delay can paste the old contents",
            ));
        }
    }

    fn validate_model(config: &Config, result: &mut ValidationResult) {
        match url::Url::parse(&config.model.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(_) => result.add_error(ValidationError::new(
                "model.base_url",
                "base_url must use http:// or https://",
            )),
            Err(e) => result.add_error(ValidationError::new(
                "model.base_url",
                format!("invalid URL: {}", e),
            )),
        }

        if config.model.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "model.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_diagnostics(config: &Config, result: &mut ValidationResult) {
        if config.diagnostics.probe_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "diagnostics.probe_timeout_ms",
                "probe_timeout_ms must be greater than 0",
            ));
        }

        if config.diagnostics.benchmark_app.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                "diagnostics.benchmark_app",
                "no benchmark app set; tree-dump latency will not be measured",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
