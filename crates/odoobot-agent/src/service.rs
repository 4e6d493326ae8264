// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat turn handler and the operations around it.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveTime, Utc};
use odoobot_config::model::{DefaultsConfig, RetentionConfig};
use odoobot_config::OdoobotConfig;
use odoobot_core::{
    ChatMessage, ChatbotConfig, CompletionProvider, CompletionRequest, ConversationMessage,
    MessageResolution, MessageStats, MessageStatus, OdoobotError, SessionSummary, StorageAdapter,
    TokenUsage, UserContext,
};
use odoobot_mcp::McpClient;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::format::{format_error, format_response};
use crate::retention::{self, SweepReport};

/// Length of generated session ids.
const SESSION_ID_LEN: usize = 12;

/// History page bounds.
pub const HISTORY_LIMIT_DEFAULT: u32 = 10;
pub const HISTORY_LIMIT_MAX: u32 = 100;

const PROBE_PROMPT: &str =
    "Hello, please respond with \"Connection successful\" if you can read this.";
const PROBE_MAX_TOKENS: u32 = 50;
const TEST_RESULT_MAX_CHARS: usize = 500;

/// One user submission.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user: UserContext,
    pub user_input: String,
    /// Continue this session; a new id is generated when absent or blank.
    pub session_id: Option<String>,
    /// Return the raw reply instead of HTML.
    pub fast_mode: bool,
}

/// Result of a turn that reached the chat model.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub success: bool,
    pub message_id: String,
    pub session_id: String,
    pub user_input: String,
    /// Display text: HTML, or plain text in fast mode.
    pub bot_response: String,
    /// User-facing error, when `success` is false.
    pub error: Option<String>,
    pub response_time: f64,
    pub usage: Option<TokenUsage>,
    pub fast_mode: bool,
    pub timestamp: String,
}

/// Outcome of a connection probe, as stored on the configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub result: String,
}

/// Generate a short random session id.
pub fn new_session_id() -> String {
    let mut id = uuid::Uuid::new_v4().to_string();
    id.truncate(SESSION_ID_LEN);
    id
}

/// Clamp a requested history page size.
pub fn clamp_history_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(HISTORY_LIMIT_DEFAULT)
        .clamp(1, HISTORY_LIMIT_MAX)
}

/// Start of the current UTC day as a stored timestamp.
fn utc_midnight() -> String {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    odoobot_core::format_timestamp(midnight)
}

/// Handles chat turns against the active configuration.
pub struct ChatService {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn CompletionProvider>,
    mcp: McpClient,
    defaults: DefaultsConfig,
    retention: RetentionConfig,
    context_turns: u32,
}

impl ChatService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn CompletionProvider>,
        mcp: McpClient,
        config: &OdoobotConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            mcp,
            defaults: config.defaults.clone(),
            retention: config.retention.clone(),
            context_turns: config.chat.context_turns,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// The active configuration, seeding one from `[defaults]` on first use.
    pub async fn active_config(&self) -> Result<ChatbotConfig, OdoobotError> {
        let seed = self.defaults.seed_config(&odoobot_core::timestamp());
        self.storage.get_or_create_active_config(&seed).await
    }

    async fn config_by_id(&self, id: i64) -> Result<ChatbotConfig, OdoobotError> {
        self.storage
            .get_config(id)
            .await?
            .ok_or_else(|| OdoobotError::NotFound {
                entity: "configuration",
                id: id.to_string(),
            })
    }

    async fn check_daily_limit(&self, config: &ChatbotConfig) -> Result<(), OdoobotError> {
        if config.daily_message_limit == 0 {
            return Ok(());
        }
        let today = self.storage.count_messages_since(&utc_midnight()).await?;
        if today >= i64::from(config.daily_message_limit) {
            warn!(limit = config.daily_message_limit, today, "daily message limit reached");
            return Err(OdoobotError::LimitReached {
                limit: config.daily_message_limit,
            });
        }
        Ok(())
    }

    /// Previous processed turns of the user's session, oldest first, plus the new input.
    async fn build_conversation(
        &self,
        user_id: i64,
        session_id: &str,
        user_input: &str,
    ) -> Result<Vec<ConversationMessage>, OdoobotError> {
        let mut conversation = Vec::new();
        if self.context_turns > 0 {
            for turn in self
                .storage
                .session_turns(user_id, session_id, self.context_turns)
                .await?
            {
                conversation.push(ConversationMessage::user(turn.user_input));
                conversation.push(ConversationMessage::assistant(
                    turn.bot_response.unwrap_or_default(),
                ));
            }
        }
        conversation.push(ConversationMessage::user(user_input));
        Ok(conversation)
    }

    /// Handle one chat turn.
    ///
    /// Returns `Err` only when the turn was refused before a message was
    /// stored (empty input, daily limit) or storage failed. A failed
    /// completion is stored and reported as `success: false`.
    pub async fn send_message(&self, request: TurnRequest) -> Result<TurnOutcome, OdoobotError> {
        let user_input = request.user_input.trim().to_string();
        if user_input.is_empty() {
            return Err(OdoobotError::Validation("Message cannot be empty".into()));
        }

        let config = self.active_config().await?;
        self.check_daily_limit(&config).await?;

        let session_id = request
            .session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(new_session_id);
        let now = odoobot_core::timestamp();
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: request.user.user_id,
            session_id: session_id.clone(),
            config_id: Some(config.id),
            user_input: user_input.clone(),
            bot_response: None,
            status: MessageStatus::Draft,
            response_time: 0.0,
            error_message: None,
            usage_data: None,
            created_at: now.clone(),
            updated_at: now,
        };
        // Context is read before the row exists so a storage failure
        // cannot strand a message in `sent`.
        let conversation = self
            .build_conversation(message.user_id, &session_id, &user_input)
            .await?;
        self.storage.insert_message(&message).await?;
        self.storage
            .transition_message(&message.id, MessageStatus::Sent)
            .await?;

        let started = Instant::now();
        let completion = self
            .provider
            .complete(CompletionRequest {
                conversation,
                config,
                user: request.user,
                temperature: None,
                max_tokens: None,
            })
            .await;
        let elapsed = started.elapsed();
        let response_time = elapsed.as_secs_f64();

        let outcome = match completion {
            Ok(result) => {
                let usage_data = serde_json::to_string(&result.usage).ok();
                self.storage
                    .finish_message(
                        &message.id,
                        &MessageResolution::Processed {
                            bot_response: result.text.clone(),
                            response_time,
                            usage_data,
                        },
                    )
                    .await?;
                info!(
                    message_id = %message.id,
                    session_id = %session_id,
                    response_time,
                    tool_rounds = result.tool_rounds,
                    "turn processed"
                );
                TurnOutcome {
                    success: true,
                    message_id: message.id,
                    session_id,
                    user_input,
                    bot_response: if request.fast_mode {
                        result.text
                    } else {
                        format_response(&result.text, Some(elapsed))
                    },
                    error: None,
                    response_time,
                    usage: Some(result.usage),
                    fast_mode: request.fast_mode,
                    timestamp: odoobot_core::timestamp(),
                }
            }
            Err(e) => {
                error!(message_id = %message.id, error = %e, "turn failed");
                self.storage
                    .finish_message(
                        &message.id,
                        &MessageResolution::Failed {
                            error_message: e.to_string(),
                            response_time,
                        },
                    )
                    .await?;
                let shown = e.user_message();
                TurnOutcome {
                    success: false,
                    message_id: message.id,
                    session_id,
                    user_input,
                    bot_response: if request.fast_mode {
                        shown.clone()
                    } else {
                        format_error(&shown)
                    },
                    error: Some(shown),
                    response_time,
                    usage: None,
                    fast_mode: request.fast_mode,
                    timestamp: odoobot_core::timestamp(),
                }
            }
        };
        Ok(outcome)
    }

    /// A user's messages, newest first. `limit` is clamped to 1..=100.
    pub async fn history(
        &self,
        user_id: i64,
        session_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, OdoobotError> {
        self.storage
            .recent_messages(user_id, session_id, clamp_history_limit(limit))
            .await
    }

    pub async fn sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, OdoobotError> {
        self.storage.list_sessions(user_id).await
    }

    pub async fn statistics(&self, user_id: i64) -> Result<MessageStats, OdoobotError> {
        self.storage.message_statistics(user_id).await
    }

    /// Send a fixed probe with configuration `config_id` and store the result.
    pub async fn test_connection(
        &self,
        config_id: i64,
        user: &UserContext,
    ) -> Result<ConnectionTest, OdoobotError> {
        let config = self.config_by_id(config_id).await?;
        let probe = self
            .provider
            .complete(CompletionRequest {
                conversation: vec![ConversationMessage::user(PROBE_PROMPT)],
                config,
                user: user.clone(),
                temperature: Some(0.0),
                max_tokens: Some(PROBE_MAX_TOKENS),
            })
            .await;

        let test = match probe {
            Ok(result) => ConnectionTest {
                success: true,
                result: odoobot_core::truncate_chars(&result.text, TEST_RESULT_MAX_CHARS),
            },
            Err(e) => {
                warn!(config_id, error = %e, "connection test failed");
                ConnectionTest {
                    success: false,
                    result: odoobot_core::truncate_chars(
                        &format!("Error: {e}"),
                        TEST_RESULT_MAX_CHARS,
                    ),
                }
            }
        };
        self.storage
            .record_connection_test(config_id, &odoobot_core::timestamp(), &test.result)
            .await?;
        Ok(test)
    }

    /// Ask the MCP server to log into Odoo with the configuration's credentials.
    pub async fn connect_mcp(&self, config_id: i64) -> Result<String, OdoobotError> {
        let config = self.config_by_id(config_id).await?;
        let endpoint = config
            .mcp_endpoint()
            .ok_or_else(|| OdoobotError::Validation("MCP Server URL is required".into()))?;
        let credentials = config.odoo_credentials().ok_or_else(|| {
            OdoobotError::Validation(
                "Odoo URL, database, username and password are required to connect".into(),
            )
        })?;

        let message = self.mcp.connect(endpoint, &credentials).await?;
        self.storage.set_mcp_connected(config_id, true).await?;
        info!(config_id, "MCP server connected");
        Ok(message)
    }

    pub async fn disconnect_mcp(&self, config_id: i64) -> Result<(), OdoobotError> {
        let config = self.config_by_id(config_id).await?;
        if !config.mcp_connected {
            return Err(OdoobotError::Validation("MCP is not connected".into()));
        }
        self.storage.set_mcp_connected(config_id, false).await?;
        info!(config_id, "MCP server disconnected");
        Ok(())
    }

    /// Run one retention sweep with the deployment's retention settings.
    pub async fn cleanup(&self) -> Result<SweepReport, OdoobotError> {
        retention::sweep(self.storage.as_ref(), &self.retention).await
    }

    /// Retention settings, for the background sweeper.
    pub fn retention(&self) -> &RetentionConfig {
        &self.retention
    }
}
