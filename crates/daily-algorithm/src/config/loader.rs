use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::service::parse_schedule;

pub const CONFIG_FILE_NAME: &str = "config.json";

const SCHEMA_JSON: &str = include_str!("../../schema/config.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

/// Loads `<config_dir>/config.json`, or the defaults when it does not exist.
pub fn load_or_default<P: AsRef<Path>>(config_dir: P) -> Result<Config, ConfigError> {
    let path = config_dir.as_ref().join(CONFIG_FILE_NAME);
    if !path.exists() {
        log::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config {
            config_dir: config_dir.as_ref().to_path_buf(),
            ..Config::default()
        });
    }
    log::info!("Loading config from {}", path.display());
    let mut config = load_config(&path)?;
    config.config_dir = config_dir.as_ref().to_path_buf();
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.concurrency == 0 {
        return Err(ConfigError::Validation {
            message: "concurrency must be at least 1".to_string(),
        });
    }

    if config.max_discovery_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "maxDiscoveryAttempts must be at least 1".to_string(),
        });
    }

    parse_schedule(&config.generate_schedule)?;
    parse_schedule(&config.upload_schedule)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::publish::PrivacyStatus;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.callback_port, 4160);
        assert_eq!(config.privacy_status, PrivacyStatus::Public);
        assert_eq!(config.duplicate_window_days, 90);
        assert_eq!(config.max_discovery_attempts, 10);
        assert_eq!(config.video_cache_ttl_hours, Some(24));
        assert_eq!(config.bundle_cache_ttl_hours, None);
        assert_eq!(config.generate_schedule, "0 0 */6 * * *");
        assert_eq!(config.upload_schedule, "0 */4 * * *");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.concurrency >= 1);
        assert!(config.app_dir.ends_with(".local/share/the-daily-algorithm"));
    }

    #[test]
    fn test_load_overrides() {
        let config = load_config_from_str(
            r#"{
                "appDir": "/srv/tda",
                "privacyStatus": "unlisted",
                "concurrency": 2,
                "videoCacheTtlHours": null,
                "logFormat": "json"
            }"#,
        )
        .unwrap();
        assert_eq!(config.app_dir, std::path::PathBuf::from("/srv/tda"));
        assert_eq!(config.privacy_status, PrivacyStatus::Unlisted);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.video_cache_ttl_hours, None);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.render_entry_point(),
            std::path::PathBuf::from("/srv/tda/remotion/src/index.ts")
        );
    }

    #[test]
    fn test_unknown_field_rejected_by_schema() {
        let result = load_config_from_str(r#"{"workerCount": 4}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_invalid_privacy_rejected() {
        let result = load_config_from_str(r#"{"privacyStatus": "secret"}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = load_config_from_str(r#"{"concurrency": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let result = load_config_from_str(r#"{"uploadSchedule": "every tuesday"}"#);
        assert!(matches!(result, Err(ConfigError::InvalidSchedule { .. })));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            load_config_from_str("{not json"),
            Err(ConfigError::ParseJson(_))
        ));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(dir.path()).unwrap();
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.callback_port, 4160);
    }

    #[test]
    fn test_load_or_default_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"callbackPort": 5000}"#,
        )
        .unwrap();
        let config = load_or_default(dir.path()).unwrap();
        assert_eq!(config.callback_port, 5000);
        assert_eq!(config.config_dir, dir.path());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/config.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
