// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty paths,
//! numeric ranges, and known model ids. All failures are collected.

use std::str::FromStr;

use odoobot_core::ClaudeModel;
use odoobot_core::types::{MAX_TOKENS_RANGE, TEMPERATURE_RANGE};

use crate::diagnostic::ConfigError;
use crate::model::OdoobotConfig;

/// Upper bound on `anthropic.max_continuations`.
pub const MAX_CONTINUATIONS_LIMIT: u32 = 8;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every failure found rather than stopping at the first one.
pub fn validate_config(config: &OdoobotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of: {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }

    if config.anthropic.base_url.trim().is_empty() {
        fail("anthropic.base_url must not be empty".to_string());
    }

    if !(1..=MAX_CONTINUATIONS_LIMIT).contains(&config.anthropic.max_continuations) {
        fail(format!(
            "anthropic.max_continuations must be between 1 and {MAX_CONTINUATIONS_LIMIT}, got {}",
            config.anthropic.max_continuations
        ));
    }

    if config.mcp.timeout_secs == 0 {
        fail("mcp.timeout_secs must be at least 1".to_string());
    }

    if config.retention.message_days == 0 {
        fail("retention.message_days must be at least 1".to_string());
    }

    if config.retention.service_call_days == 0 {
        fail("retention.service_call_days must be at least 1".to_string());
    }

    if config.retention.sweep_interval_secs == 0 {
        fail("retention.sweep_interval_secs must be at least 1".to_string());
    }

    let defaults = &config.defaults;
    if ClaudeModel::from_str(&defaults.model).is_err() {
        fail(format!("defaults.model `{}` is not a known Claude model", defaults.model));
    }

    let (t_lo, t_hi) = TEMPERATURE_RANGE;
    if !(t_lo..=t_hi).contains(&defaults.temperature) {
        fail(format!(
            "defaults.temperature must be between {t_lo} and {t_hi}, got {}",
            defaults.temperature
        ));
    }

    let (m_lo, m_hi) = MAX_TOKENS_RANGE;
    if !(m_lo..=m_hi).contains(&defaults.max_tokens) {
        fail(format!(
            "defaults.max_tokens must be between {m_lo} and {m_hi}, got {}",
            defaults.max_tokens
        ));
    }

    if defaults.timeout_secs == 0 {
        fail("defaults.timeout_secs must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_config(&OdoobotConfig::default()).unwrap();
    }

    #[test]
    fn collects_every_failure() {
        let mut config = OdoobotConfig::default();
        config.storage.database_path = " ".into();
        config.anthropic.max_continuations = 0;
        config.defaults.temperature = 2.0;
        config.defaults.model = "gpt-4".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4, "got: {errors:?}");
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = OdoobotConfig::default();
        config.agent.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("agent.log_level"));
    }
}
