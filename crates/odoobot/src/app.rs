// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every command: tracing, storage, and the chat service.

use std::sync::Arc;

use odoobot_agent::ChatService;
use odoobot_anthropic::CompletionClient;
use odoobot_config::OdoobotConfig;
use odoobot_core::{CallRecorder, ChatbotConfig, OdoobotError, StorageAdapter};
use odoobot_mcp::McpToolExecutor;
use odoobot_storage::SqliteStorage;
use tracing::debug;

/// Storage plus the chat service built on it.
pub struct App {
    pub storage: Arc<SqliteStorage>,
    pub service: Arc<ChatService>,
}

impl App {
    /// Open storage and assemble the completion client, MCP tools and chat service.
    pub async fn build(config: &OdoobotConfig) -> Result<Self, OdoobotError> {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        let recorder: Arc<dyn CallRecorder> = storage.clone();

        let tools = McpToolExecutor::from_config(&config.mcp, Some(recorder.clone()))?;
        let mcp = tools.client().clone();
        let provider =
            CompletionClient::new(&config.anthropic, Some(recorder))?.with_tools(Arc::new(tools));

        let service = Arc::new(ChatService::new(
            storage.clone(),
            Arc::new(provider),
            mcp,
            config,
        ));
        debug!(database = %config.storage.database_path, "application assembled");
        Ok(Self { storage, service })
    }

    /// Configuration `id`, or the active one (seeded on first use).
    pub async fn config_or_active(&self, id: Option<i64>) -> Result<ChatbotConfig, OdoobotError> {
        match id {
            Some(id) => self
                .storage
                .get_config(id)
                .await?
                .ok_or_else(|| OdoobotError::NotFound {
                    entity: "configuration",
                    id: id.to_string(),
                }),
            None => self.service.active_config().await,
        }
    }

    pub async fn close(&self) -> Result<(), OdoobotError> {
        self.storage.close().await
    }
}

/// Install the global tracing subscriber. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("odoobot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
