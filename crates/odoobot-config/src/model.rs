// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use odoobot_core::{ChatbotConfig, ClaudeModel, UserContext};

/// Top-level deployment configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OdoobotConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Anthropic Messages API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// MCP server client settings.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// History retention settings.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Turn handling settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Seed values for the first configuration record.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Acting user when a request does not identify one.
    #[serde(default)]
    pub operator: OperatorConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "odoobot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Anthropic API configuration.
///
/// The API key itself lives on the stored configuration record, not here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Messages endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `anthropic-version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Optional `anthropic-beta` header value.
    #[serde(default)]
    pub beta: Option<String>,

    /// Maximum follow-up calls carrying tool results per turn.
    #[serde(default = "default_max_continuations")]
    pub max_continuations: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            beta: None,
            max_continuations: default_max_continuations(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_max_continuations() -> u32 {
    1
}

/// MCP server client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    /// Per-request timeout for `/search`, `/read`, and `/connect`.
    #[serde(default = "default_mcp_timeout")]
    pub timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_mcp_timeout(),
        }
    }
}

fn default_mcp_timeout() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("odoobot").join("odoobot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("odoobot.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/api/*` routes. Without one, every API
    /// request is rejected.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8069
}

/// History retention configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Messages older than this many days are deleted.
    #[serde(default = "default_message_days")]
    pub message_days: u32,

    /// Service-call log rows older than this many days are deleted.
    #[serde(default = "default_service_call_days")]
    pub service_call_days: u32,

    /// Seconds between sweeps while serving.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            message_days: default_message_days(),
            service_call_days: default_service_call_days(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_message_days() -> u32 {
    30
}

fn default_service_call_days() -> u32 {
    7
}

fn default_sweep_interval() -> u64 {
    3600
}

/// Turn handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Previous processed turns of the session replayed to the model.
    #[serde(default = "default_context_turns")]
    pub context_turns: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_turns: default_context_turns(),
        }
    }
}

fn default_context_turns() -> u32 {
    10
}

/// Seed for the configuration record created when none exists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(default = "default_config_name")]
    pub name: String,

    /// Claude model id.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_mcp_server_url")]
    pub mcp_server_url: Option<String>,

    /// 0 disables the limit.
    #[serde(default = "default_daily_message_limit")]
    pub daily_message_limit: u32,

    #[serde(default)]
    pub system_prompt_prefix: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            name: default_config_name(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            mcp_server_url: default_mcp_server_url(),
            daily_message_limit: default_daily_message_limit(),
            system_prompt_prefix: None,
        }
    }
}

impl DefaultsConfig {
    /// Build an unsaved, active configuration record from these defaults.
    ///
    /// An unknown model id falls back to the default model; validation
    /// reports it at startup.
    pub fn seed_config(&self, now: &str) -> ChatbotConfig {
        ChatbotConfig {
            id: 0,
            name: self.name.clone(),
            api_key: None,
            model_name: ClaudeModel::from_str(&self.model).unwrap_or_default(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
            mcp_server_url: self.mcp_server_url.clone(),
            mcp_connected: false,
            daily_message_limit: self.daily_message_limit,
            active: true,
            system_prompt_prefix: self.system_prompt_prefix.clone(),
            odoo_url: None,
            odoo_db: None,
            odoo_username: None,
            odoo_password: None,
            last_test_date: None,
            last_test_result: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

fn default_config_name() -> String {
    "MCP Configuration".to_string()
}

fn default_model() -> String {
    ClaudeModel::default().to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    30
}

fn default_mcp_server_url() -> Option<String> {
    Some("https://mpc-server-odoo.onrender.com".to_string())
}

fn default_daily_message_limit() -> u32 {
    1000
}

/// Default acting user.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    #[serde(default = "default_operator_id")]
    pub user_id: i64,

    #[serde(default = "default_operator_name")]
    pub name: String,

    #[serde(default = "default_operator_company")]
    pub company: String,

    #[serde(default)]
    pub lang: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            user_id: default_operator_id(),
            name: default_operator_name(),
            company: default_operator_company(),
            lang: None,
        }
    }
}

impl OperatorConfig {
    pub fn user_context(&self) -> UserContext {
        UserContext {
            user_id: self.user_id,
            name: self.name.clone(),
            company: self.company.clone(),
            lang: self.lang.clone(),
        }
    }
}

fn default_operator_id() -> i64 {
    1
}

fn default_operator_name() -> String {
    "Administrator".to_string()
}

fn default_operator_company() -> String {
    "My Company".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = OdoobotConfig::default();
        assert_eq!(config.agent.name, "odoobot");
        assert_eq!(config.agent.log_level, "info");
        assert_eq!(config.anthropic.api_version, "2023-06-01");
        assert_eq!(config.anthropic.max_continuations, 1);
        assert!(config.anthropic.beta.is_none());
        assert_eq!(config.mcp.timeout_secs, 30);
        assert!(config.storage.wal_mode);
        assert!(config.gateway.bearer_token.is_none());
        assert_eq!(config.retention.message_days, 30);
        assert_eq!(config.retention.service_call_days, 7);
        assert_eq!(config.defaults.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.defaults.daily_message_limit, 1000);
    }

    #[test]
    fn seed_config_is_active_without_key() {
        let seed = DefaultsConfig::default().seed_config("2026-01-01T00:00:00.000Z");
        assert!(seed.active);
        assert!(seed.api_key.is_none());
        assert!(!seed.mcp_connected);
        assert_eq!(seed.name, "MCP Configuration");
        assert_eq!(seed.max_tokens, 4096);
        seed.validate().unwrap();
    }

    #[test]
    fn gateway_debug_redacts_token() {
        let gw = GatewayConfig {
            bearer_token: Some("super-secret".into()),
            ..GatewayConfig::default()
        };
        let out = format!("{gw:?}");
        assert!(!out.contains("super-secret"));
        assert!(out.contains("[redacted]"));
    }

    #[test]
    fn operator_builds_user_context() {
        let ctx = OperatorConfig::default().user_context();
        assert_eq!(ctx.user_id, 1);
        assert_eq!(ctx.name, "Administrator");
        assert!(ctx.lang.is_none());
    }
}
