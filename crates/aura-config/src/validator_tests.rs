use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
}

#[test]
fn test_validate_zero_resume_timeout() {
    let mut config = Config::default();
    config.execution.resume_timeout_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "execution.resume_timeout_ms"));
}

#[test]
fn test_validate_resume_longer_than_command_warns() {
    let mut config = Config::default();
    config.execution.command_timeout_ms = 1_000;
    config.execution.resume_timeout_ms = 10_000;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.path == "execution.resume_timeout_ms"));
}

#[test]
fn test_validate_zero_awaiting_expiry() {
    let mut config = Config::default();
    config.execution.awaiting_expiry_secs = Some(0);

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_validate_empty_cliclick_path() {
    let mut config = Config::default();
    config.input.cliclick_path = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "input.cliclick_path"));
}

#[test]
fn test_validate_empty_cliclick_path_ignored_for_other_backends() {
    let mut config = Config::default();
    config.input.backend = InputBackend::Osascript;
    config.input.cliclick_path = String::new();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
}

#[test]
fn test_validate_zero_chunk_size() {
    let mut config = Config::default();
    config.injection.chunk_size = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_validate_low_paste_threshold_warns() {
    let mut config = Config::default();
    config.injection.paste_threshold = 5;
    config.injection.chunk_size = 40;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.path == "injection.paste_threshold"));
}

#[test]
fn test_validate_invalid_base_url() {
    let mut config = Config::default();
    config.model.base_url = "localhost:1234".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "model.base_url"));
}

#[test]
fn test_validate_non_http_base_url() {
    let mut config = Config::default();
    config.model.base_url = "ftp://localhost/v1".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_validation_result_default() {
    let result = ValidationResult::default();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validation_error_new() {
    let err = ValidationError::new("model.base_url", "must be http");
    assert_eq!(err.path, "model.base_url");
    assert_eq!(err.message, "must be http");
}
