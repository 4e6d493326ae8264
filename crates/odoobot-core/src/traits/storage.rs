// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::OdoobotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChatMessage, ChatbotConfig, MessageResolution, MessageStats, MessageStatus, SessionSummary,
};

/// Adapter for storage and persistence backends.
///
/// Holds configuration records and the message history. Implementations
/// keep at most one configuration active and never move a message status
/// backwards.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), OdoobotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), OdoobotError>;

    // --- Configuration records ---

    /// Insert a configuration and return its id. `config.id` is ignored.
    async fn insert_config(&self, config: &ChatbotConfig) -> Result<i64, OdoobotError>;

    async fn get_config(&self, id: i64) -> Result<Option<ChatbotConfig>, OdoobotError>;

    async fn list_configs(&self) -> Result<Vec<ChatbotConfig>, OdoobotError>;

    async fn update_config(&self, config: &ChatbotConfig) -> Result<(), OdoobotError>;

    /// Make `id` the only active configuration.
    async fn activate_config(&self, id: i64) -> Result<(), OdoobotError>;

    /// The active configuration, promoting or creating one from `seed` if needed.
    async fn get_or_create_active_config(
        &self,
        seed: &ChatbotConfig,
    ) -> Result<ChatbotConfig, OdoobotError>;

    async fn record_connection_test(
        &self,
        id: i64,
        tested_at: &str,
        result: &str,
    ) -> Result<(), OdoobotError>;

    async fn set_mcp_connected(&self, id: i64, connected: bool) -> Result<(), OdoobotError>;

    // --- Messages ---

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), OdoobotError>;

    async fn get_message(&self, id: &str) -> Result<Option<ChatMessage>, OdoobotError>;

    /// Move a message to `status` without touching its content.
    async fn transition_message(
        &self,
        id: &str,
        status: MessageStatus,
    ) -> Result<(), OdoobotError>;

    /// Write the terminal outcome of a turn.
    async fn finish_message(
        &self,
        id: &str,
        resolution: &MessageResolution,
    ) -> Result<(), OdoobotError>;

    /// Newest first.
    async fn recent_messages(
        &self,
        user_id: i64,
        session_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, OdoobotError>;

    /// Up to `limit` processed turns of `user_id`'s session, oldest first.
    async fn session_turns(
        &self,
        user_id: i64,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, OdoobotError>;

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, OdoobotError>;

    async fn message_statistics(&self, user_id: i64) -> Result<MessageStats, OdoobotError>;

    /// Messages created at or after `since` (a stored timestamp string).
    async fn count_messages_since(&self, since: &str) -> Result<i64, OdoobotError>;

    // --- Retention ---

    async fn delete_messages_before(&self, cutoff: &str) -> Result<usize, OdoobotError>;

    async fn delete_service_calls_before(&self, cutoff: &str) -> Result<usize, OdoobotError>;
}
