// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the Odoobot crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::OdoobotError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    ToolExecutor,
}

/// Claude models selectable on a configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum ClaudeModel {
    #[default]
    #[strum(serialize = "claude-3-5-sonnet-20241022")]
    #[serde(rename = "claude-3-5-sonnet-20241022")]
    Sonnet35,
    #[strum(serialize = "claude-3-5-haiku-20241022")]
    #[serde(rename = "claude-3-5-haiku-20241022")]
    Haiku35,
    #[strum(serialize = "claude-3-opus-20240229")]
    #[serde(rename = "claude-3-opus-20240229")]
    Opus3,
    #[strum(serialize = "claude-3-sonnet-20240229")]
    #[serde(rename = "claude-3-sonnet-20240229")]
    Sonnet3,
    #[strum(serialize = "claude-3-haiku-20240307")]
    #[serde(rename = "claude-3-haiku-20240307")]
    Haiku3,
}

/// Lifecycle status of a chat message.
///
/// Moves forward only: `draft -> sent -> processed | error`, with
/// `draft -> processed | error` allowed for turns that skip the send step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Draft,
    Sent,
    Processed,
    Error,
}

impl MessageStatus {
    /// Whether the status is terminal.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Processed | Self::Error)
    }

    /// Statuses a message may be in immediately before moving to `target`.
    pub fn predecessors(target: Self) -> &'static [Self] {
        match target {
            Self::Draft => &[],
            Self::Sent => &[Self::Draft],
            Self::Processed | Self::Error => &[Self::Draft, Self::Sent],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        Self::predecessors(next).contains(&self)
    }
}

/// Inclusive limits enforced on configuration records.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 1.0);
pub const MAX_TOKENS_RANGE: (u32, u32) = (1, 100_000);
const API_KEY_PREFIX: &str = "sk-ant-";
const API_KEY_MIN_LEN: usize = 50;

/// A stored chatbot configuration record.
///
/// At most one record is active at a time; the store enforces this on write.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub id: i64,
    pub name: String,
    pub api_key: Option<String>,
    pub model_name: ClaudeModel,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub mcp_server_url: Option<String>,
    pub mcp_connected: bool,
    /// 0 disables the limit.
    pub daily_message_limit: u32,
    pub active: bool,
    pub system_prompt_prefix: Option<String>,
    pub odoo_url: Option<String>,
    pub odoo_db: Option<String>,
    pub odoo_username: Option<String>,
    pub odoo_password: Option<String>,
    pub last_test_date: Option<String>,
    pub last_test_result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl std::fmt::Debug for ChatbotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbotConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("mcp_server_url", &self.mcp_server_url)
            .field("mcp_connected", &self.mcp_connected)
            .field("daily_message_limit", &self.daily_message_limit)
            .field("active", &self.active)
            .field("odoo_url", &self.odoo_url)
            .field("odoo_db", &self.odoo_db)
            .field("odoo_username", &self.odoo_username)
            .field("odoo_password", &self.odoo_password.as_ref().map(|_| "[redacted]"))
            .field("last_test_date", &self.last_test_date)
            .finish_non_exhaustive()
    }
}

impl ChatbotConfig {
    /// The API key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// The MCP server URL, treating an empty string as absent.
    pub fn mcp_endpoint(&self) -> Option<&str> {
        self.mcp_server_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Tool use is offered to the model only with a connected MCP server.
    pub fn tools_enabled(&self) -> bool {
        self.mcp_connected && self.mcp_endpoint().is_some()
    }

    /// Odoo credentials for MCP connect, if all four are filled in.
    pub fn odoo_credentials(&self) -> Option<OdooCredentials> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Some(OdooCredentials {
            url: non_empty(&self.odoo_url)?,
            database: non_empty(&self.odoo_db)?,
            username: non_empty(&self.odoo_username)?,
            password: non_empty(&self.odoo_password)?,
        })
    }

    /// Check field constraints. Run before every write.
    pub fn validate(&self) -> Result<(), OdoobotError> {
        if self.name.trim().is_empty() {
            return Err(OdoobotError::Validation(
                "configuration name must not be empty".into(),
            ));
        }
        if let Some(key) = self.api_key() {
            if !key.starts_with(API_KEY_PREFIX) {
                return Err(OdoobotError::Validation(format!(
                    "API key must start with '{API_KEY_PREFIX}'"
                )));
            }
            if key.len() < API_KEY_MIN_LEN {
                return Err(OdoobotError::Validation(
                    "API key appears to be too short".into(),
                ));
            }
        }
        let (t_lo, t_hi) = TEMPERATURE_RANGE;
        if !(t_lo..=t_hi).contains(&self.temperature) {
            return Err(OdoobotError::Validation(format!(
                "temperature must be between {t_lo} and {t_hi}, got {}",
                self.temperature
            )));
        }
        let (m_lo, m_hi) = MAX_TOKENS_RANGE;
        if !(m_lo..=m_hi).contains(&self.max_tokens) {
            return Err(OdoobotError::Validation(format!(
                "max_tokens must be between {m_lo} and {m_hi}, got {}",
                self.max_tokens
            )));
        }
        if self.timeout_secs == 0 {
            return Err(OdoobotError::Validation(
                "timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}

/// Credentials the MCP server uses to log into Odoo.
#[derive(Clone, Serialize, Deserialize)]
pub struct OdooCredentials {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for OdooCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooCredentials")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// One user turn and, once answered, the assistant's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: i64,
    pub session_id: String,
    pub config_id: Option<i64>,
    pub user_input: String,
    pub bot_response: Option<String>,
    pub status: MessageStatus,
    /// Seconds.
    pub response_time: f64,
    pub error_message: Option<String>,
    /// Opaque JSON describing token usage.
    pub usage_data: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Terminal outcome written onto a message.
#[derive(Debug, Clone)]
pub enum MessageResolution {
    Processed {
        bot_response: String,
        response_time: f64,
        usage_data: Option<String>,
    },
    Failed {
        error_message: String,
        response_time: f64,
    },
}

impl MessageResolution {
    pub fn status(&self) -> MessageStatus {
        match self {
            Self::Processed { .. } => MessageStatus::Processed,
            Self::Failed { .. } => MessageStatus::Error,
        }
    }
}

/// Aggregate view of one conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub last_message: String,
    pub message_count: i64,
}

/// Raw counters read from storage, before derived values are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MessageCounts {
    pub total: i64,
    pub processed: i64,
    pub error: i64,
    /// Mean over processed messages with a positive response time.
    pub avg_processed_response_time: Option<f64>,
    pub sessions: i64,
}

/// Per-user chat statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total_messages: i64,
    pub processed_messages: i64,
    pub error_messages: i64,
    /// Seconds, rounded to 2 decimals. 0 when nothing qualifies.
    pub avg_response_time: f64,
    pub sessions_count: i64,
    /// Percentage of processed messages, rounded to 1 decimal.
    pub success_rate: f64,
}

impl From<MessageCounts> for MessageStats {
    fn from(c: MessageCounts) -> Self {
        let success_rate = if c.total > 0 {
            round_to(c.processed as f64 / c.total as f64 * 100.0, 1)
        } else {
            0.0
        };
        Self {
            total_messages: c.total,
            processed_messages: c.processed,
            error_messages: c.error,
            avg_response_time: round_to(c.avg_processed_response_time.unwrap_or(0.0), 2),
            sessions_count: c.sessions,
            success_rate,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// External services whose calls are logged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Anthropic,
    Mcp,
}

/// One outbound call to an external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    pub service: ServiceKind,
    pub endpoint: String,
    pub request_data: String,
    pub response_data: Option<String>,
    pub error_message: Option<String>,
    pub success: bool,
    pub created_at: String,
}

/// Speaker of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A plain-text conversation turn handed to the completion client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The person the assistant is talking to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: i64,
    pub name: String,
    pub company: String,
    pub lang: Option<String>,
}

/// Token accounting reported by the chat model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Input to a completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub conversation: Vec<ConversationMessage>,
    pub config: ChatbotConfig,
    pub user: UserContext,
    /// Overrides `config.temperature`.
    pub temperature: Option<f64>,
    /// Overrides `config.max_tokens`.
    pub max_tokens: Option<u32>,
}

/// Output of a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub success: bool,
    pub text: String,
    /// Usage of the final chat call.
    pub usage: TokenUsage,
    /// Number of continuation calls made with tool results.
    pub tool_rounds: u32,
    /// The model still wanted tools when the continuation limit was hit.
    pub truncated_tool_rounds: bool,
}

/// A tool offered to the chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn sample_config() -> ChatbotConfig {
        ChatbotConfig {
            id: 1,
            name: "MCP Configuration".into(),
            api_key: Some(format!("sk-ant-{}", "a".repeat(60))),
            model_name: ClaudeModel::default(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 30,
            mcp_server_url: Some("https://mcp.example.com".into()),
            mcp_connected: false,
            daily_message_limit: 1000,
            active: true,
            system_prompt_prefix: None,
            odoo_url: None,
            odoo_db: None,
            odoo_username: None,
            odoo_password: None,
            last_test_date: None,
            last_test_result: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn claude_model_ids_round_trip() {
        for model in ClaudeModel::iter() {
            let id = model.to_string();
            assert!(id.starts_with("claude-3"), "unexpected id {id}");
            assert_eq!(ClaudeModel::from_str(&id).unwrap(), model);
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{id}\""));
        }
        assert_eq!(ClaudeModel::default().to_string(), "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn message_status_moves_forward_only() {
        use MessageStatus::*;
        assert!(Draft.can_transition_to(Sent));
        assert!(Draft.can_transition_to(Processed));
        assert!(Sent.can_transition_to(Error));
        assert!(!Sent.can_transition_to(Draft));
        assert!(!Processed.can_transition_to(Error));
        assert!(!Error.can_transition_to(Processed));
        assert!(!Processed.can_transition_to(Processed));
        assert!(Processed.is_final() && Error.is_final());
        assert_eq!(Sent.to_string(), "sent");
    }

    #[test]
    fn validate_accepts_sample_and_missing_key() {
        let mut cfg = sample_config();
        cfg.validate().unwrap();
        cfg.api_key = None;
        cfg.validate().unwrap();
        cfg.api_key = Some("  ".into());
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_key_and_ranges() {
        let mut cfg = sample_config();
        cfg.api_key = Some("sk-test-1234".into());
        assert!(matches!(cfg.validate(), Err(OdoobotError::Validation(_))));

        cfg.api_key = Some("sk-ant-short".into());
        assert!(matches!(cfg.validate(), Err(OdoobotError::Validation(_))));

        let mut cfg = sample_config();
        cfg.temperature = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = sample_config();
        cfg.max_tokens = 0;
        assert!(cfg.validate().is_err());
        cfg.max_tokens = 100_001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tools_require_connection_and_url() {
        let mut cfg = sample_config();
        assert!(!cfg.tools_enabled());
        cfg.mcp_connected = true;
        assert!(cfg.tools_enabled());
        cfg.mcp_server_url = Some(" ".into());
        assert!(!cfg.tools_enabled());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut cfg = sample_config();
        cfg.odoo_password = Some("hunter2".into());
        let out = format!("{cfg:?}");
        assert!(!out.contains("sk-ant-"));
        assert!(!out.contains("hunter2"));
        assert!(out.contains("[redacted]"));
    }

    #[test]
    fn stats_from_counts_rounds_and_handles_empty() {
        let empty = MessageStats::from(MessageCounts::default());
        assert_eq!(empty.success_rate, 0.0);
        assert_eq!(empty.avg_response_time, 0.0);

        let stats = MessageStats::from(MessageCounts {
            total: 3,
            processed: 2,
            error: 1,
            avg_processed_response_time: Some(1.23456),
            sessions: 2,
        });
        assert_eq!(stats.success_rate, 66.7);
        assert_eq!(stats.avg_response_time, 1.23);
        assert_eq!(stats.sessions_count, 2);
    }

    #[test]
    fn odoo_credentials_require_all_fields() {
        let mut cfg = sample_config();
        assert!(cfg.odoo_credentials().is_none());
        cfg.odoo_url = Some("https://erp.example.com".into());
        cfg.odoo_db = Some("prod".into());
        cfg.odoo_username = Some("admin".into());
        assert!(cfg.odoo_credentials().is_none());
        cfg.odoo_password = Some("secret".into());
        let creds = cfg.odoo_credentials().unwrap();
        assert_eq!(creds.database, "prod");
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
