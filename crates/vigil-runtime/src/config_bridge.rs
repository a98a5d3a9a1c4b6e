//! Bridge from `vigil_config::Config` to domain types.
//!
//! The config crate depends on no other internal crate, so every translation
//! into rule limits, coordinator settings and log settings happens here.

use vigil_approval::CoordinatorConfig;
use vigil_config::Config;
use vigil_rules::RuleLimits;
use vigil_telemetry::{LogConfig, LogFormat};

use crate::error::{RuntimeError, RuntimeResult};

/// Convert the `[rules]` section to [`RuleLimits`].
#[must_use]
pub fn to_rule_limits(cfg: &Config) -> RuleLimits {
    RuleLimits {
        max_conditions: cfg.rules.max_conditions,
        max_pattern_len: cfg.rules.max_pattern_len,
        regex_size_limit: cfg.rules.regex_size_limit,
        max_haystack_len: cfg.rules.max_haystack_len,
    }
}

/// Convert config to [`CoordinatorConfig`].
///
/// # Errors
///
/// Returns [`RuntimeError::InvalidSetting`] if `approval.ttl_secs` does not
/// fit a duration.
pub fn to_coordinator_config(cfg: &Config) -> RuntimeResult<CoordinatorConfig> {
    let secs = i64::try_from(cfg.approval.ttl_secs).map_err(|_| ttl_error(cfg))?;
    let ttl = chrono::Duration::try_seconds(secs).ok_or_else(|| ttl_error(cfg))?;

    Ok(CoordinatorConfig {
        ttl,
        sweep_batch_limit: cfg.approval.batch_limit(),
        sweep_retention: cfg.audit.sweep_retention(),
        limits: to_rule_limits(cfg),
    })
}

fn ttl_error(cfg: &Config) -> RuntimeError {
    RuntimeError::InvalidSetting {
        field: "approval.ttl_secs".into(),
        message: format!("{} seconds is out of range", cfg.approval.ttl_secs),
    }
}

/// Convert the `[logging]` section to [`LogConfig`].
///
/// An unrecognised format falls back to pretty output; validation normally
/// rejects it before this point.
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();

    let mut log = LogConfig::new(cfg.logging.level.clone()).with_format(format);
    for directive in &cfg.logging.directives {
        log = log.with_directive(directive.clone());
    }
    log
}
