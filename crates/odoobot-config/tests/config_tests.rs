// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use odoobot_config::diagnostic::ConfigError;
use odoobot_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "erp-assistant"
log_level = "debug"

[anthropic]
base_url = "http://localhost:9999/v1/messages"
api_version = "2023-06-01"
beta = "tools-2024-04-04"
max_continuations = 3

[mcp]
timeout_secs = 15

[storage]
database_path = "/tmp/odoobot-test.db"
wal_mode = false

[gateway]
host = "0.0.0.0"
port = 8080
bearer_token = "tok"

[retention]
message_days = 60
service_call_days = 3
sweep_interval_secs = 600

[chat]
context_turns = 4

[defaults]
name = "Sales bot"
model = "claude-3-5-haiku-20241022"
temperature = 0.2
max_tokens = 2048
timeout_secs = 45
mcp_server_url = "https://mcp.internal"
daily_message_limit = 0
system_prompt_prefix = "Answer in French."

[operator]
user_id = 7
name = "Jane"
company = "Acme"
lang = "fr_FR"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.agent.name, "erp-assistant");
    assert_eq!(config.anthropic.beta.as_deref(), Some("tools-2024-04-04"));
    assert_eq!(config.anthropic.max_continuations, 3);
    assert_eq!(config.mcp.timeout_secs, 15);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("tok"));
    assert_eq!(config.retention.message_days, 60);
    assert_eq!(config.chat.context_turns, 4);
    assert_eq!(config.defaults.daily_message_limit, 0);
    assert_eq!(config.operator.lang.as_deref(), Some("fr_FR"));

    let seed = config.defaults.seed_config("2026-01-01T00:00:00.000Z");
    assert_eq!(seed.model_name.to_string(), "claude-3-5-haiku-20241022");
    assert_eq!(seed.system_prompt_prefix.as_deref(), Some("Answer in French."));
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.agent.name, "odoobot");
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.anthropic.base_url, "https://api.anthropic.com/v1/messages");
}

#[test]
fn unknown_key_is_rejected_with_suggestion() {
    let toml = r#"
[gateway]
bearer_tken = "x"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } => {
            key == "bearer_tken" && suggestion.as_deref() == Some("bearer_token")
        }
        _ => false,
    });
    assert!(found, "expected suggestion for bearer_token, got {errors:?}");
}

#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telegram]\nbot_token = \"x\"\n")
        .expect_err("unknown section must fail");
    assert!(err.to_string().contains("telegram"), "got: {err}");
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n")
        .expect_err("string port must fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[anthropic]
max_continuations = 20

[defaults]
max_tokens = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("out of range values must fail");
    assert_eq!(errors.len(), 2, "got {errors:?}");
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn serialized_defaults_load_back() {
    let defaults = odoobot_config::OdoobotConfig::default();
    let text = toml::to_string(&defaults).expect("defaults serialize to TOML");
    let loaded = load_and_validate_str(&text).expect("serialized defaults are valid");
    assert_eq!(loaded.gateway.port, defaults.gateway.port);
    assert_eq!(loaded.defaults.model, defaults.defaults.model);
    assert_eq!(loaded.retention.message_days, defaults.retention.message_days);
    assert!(loaded.gateway.bearer_token.is_none());
}
