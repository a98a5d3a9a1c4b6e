//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, StorageBackend};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Ten years.
const MAX_TTL_SECS: u64 = 315_360_000;

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_approval(config)?;
    validate_rules(config)?;
    validate_storage(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_approval(config: &Config) -> ConfigResult<()> {
    if config.approval.ttl_secs == 0 {
        return Err(ConfigError::validation(
            "approval.ttl_secs",
            "must be greater than 0",
        ));
    }
    if config.approval.ttl_secs > MAX_TTL_SECS {
        return Err(ConfigError::validation(
            "approval.ttl_secs",
            format!("must be at most {MAX_TTL_SECS}"),
        ));
    }
    Ok(())
}

fn validate_rules(config: &Config) -> ConfigResult<()> {
    let r = &config.rules;
    for (field, value) in [
        ("rules.max_conditions", r.max_conditions),
        ("rules.max_pattern_len", r.max_pattern_len),
        ("rules.regex_size_limit", r.regex_size_limit),
        ("rules.max_haystack_len", r.max_haystack_len),
    ] {
        if value == 0 {
            return Err(ConfigError::validation(field, "must be greater than 0"));
        }
    }
    Ok(())
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    if config.storage.backend == StorageBackend::SurrealKv && config.storage.path.trim().is_empty()
    {
        return Err(ConfigError::validation(
            "storage.path",
            "required when backend is \"surrealkv\"",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::validation(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(ConfigError::validation(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(config: &Config) -> String {
        match validate(config).unwrap_err() {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut c = Config::default();
        c.approval.ttl_secs = 0;
        assert_eq!(field_of(&c), "approval.ttl_secs");
    }

    #[test]
    fn test_huge_ttl_rejected() {
        let mut c = Config::default();
        c.approval.ttl_secs = u64::MAX;
        assert_eq!(field_of(&c), "approval.ttl_secs");
    }

    #[test]
    fn test_zero_rule_limits_rejected() {
        let mut c = Config::default();
        c.rules.regex_size_limit = 0;
        assert_eq!(field_of(&c), "rules.regex_size_limit");
    }

    #[test]
    fn test_surrealkv_requires_path() {
        let mut c = Config::default();
        c.storage.backend = StorageBackend::SurrealKv;
        assert_eq!(field_of(&c), "storage.path");
        c.storage.path = "/var/lib/vigil".into();
        validate(&c).unwrap();
    }

    #[test]
    fn test_logging_values() {
        let mut c = Config::default();
        c.logging.level = "DEBUG".into();
        validate(&c).unwrap();
        c.logging.level = "loud".into();
        assert_eq!(field_of(&c), "logging.level");
        c.logging.level = "info".into();
        c.logging.format = "xml".into();
        assert_eq!(field_of(&c), "logging.format");
    }
}
