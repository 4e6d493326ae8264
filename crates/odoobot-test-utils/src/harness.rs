// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for turn-level integration testing.
//!
//! `TestHarness` assembles a [`ChatService`] over a temp SQLite database and
//! a [`MockProvider`], with an active configuration already seeded.

use std::sync::Arc;
use std::time::Duration;

use odoobot_agent::{ChatService, TurnOutcome, TurnRequest};
use odoobot_config::model::StorageConfig;
use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatbotConfig, OdoobotError, StorageAdapter, UserContext};
use odoobot_mcp::McpClient;
use odoobot_storage::SqliteStorage;

use crate::mock_provider::MockProvider;

/// Syntactically valid Anthropic key used by seeded configurations.
pub const TEST_API_KEY: &str =
    "sk-ant-REDACTED";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    api_key: Option<String>,
    daily_message_limit: u32,
    context_turns: Option<u32>,
    mcp_server_url: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            api_key: Some(TEST_API_KEY.to_string()),
            daily_message_limit: 0,
            context_turns: None,
            mcp_server_url: None,
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Seed the configuration without an API key.
    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    /// 0 (the default here) disables the limit.
    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_message_limit = limit;
        self
    }

    pub fn with_context_turns(mut self, turns: u32) -> Self {
        self.context_turns = Some(turns);
        self
    }

    /// Point the seeded configuration at an MCP server, e.g. a wiremock uri.
    pub fn with_mcp_server(mut self, url: impl Into<String>) -> Self {
        self.mcp_server_url = Some(url.into());
        self
    }

    /// Build the harness: temp database, mock provider, seeded configuration.
    pub async fn build(self) -> Result<TestHarness, OdoobotError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| OdoobotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = OdoobotConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        if let Some(turns) = self.context_turns {
            config.chat.context_turns = turns;
        }

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let mock_provider = Arc::new(if self.responses.is_empty() {
            MockProvider::new()
        } else {
            MockProvider::with_responses(self.responses)
        });

        let mcp = McpClient::new(Duration::from_secs(5))?.with_recorder(storage.clone());
        let service = Arc::new(ChatService::new(
            storage.clone(),
            mock_provider.clone(),
            mcp,
            &config,
        ));

        let mut active = service.active_config().await?;
        active.api_key = self.api_key;
        active.daily_message_limit = self.daily_message_limit;
        active.mcp_server_url = self.mcp_server_url;
        storage.update_config(&active).await?;

        Ok(TestHarness {
            mock_provider,
            storage,
            service,
            config,
            config_id: active.id,
            _temp_dir: temp_dir,
        })
    }
}

/// A chat service over temp storage and a mock provider.
pub struct TestHarness {
    /// The scripted completion provider.
    pub mock_provider: Arc<MockProvider>,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub service: Arc<ChatService>,
    /// Deployment configuration the service was built from.
    pub config: OdoobotConfig,
    /// Id of the seeded, active configuration record.
    pub config_id: i64,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The operator user from the deployment configuration.
    pub fn user(&self) -> UserContext {
        self.config.operator.user_context()
    }

    /// Send `text` as the operator in `session_id` (a new session when `None`).
    pub async fn send(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<TurnOutcome, OdoobotError> {
        self.service
            .send_message(TurnRequest {
                user: self.user(),
                user_input: text.to_string(),
                session_id: session_id.map(str::to_string),
                fast_mode: false,
            })
            .await
    }

    /// The seeded configuration as currently stored.
    pub async fn stored_config(&self) -> Result<ChatbotConfig, OdoobotError> {
        self.storage
            .get_config(self.config_id)
            .await?
            .ok_or_else(|| OdoobotError::NotFound {
                entity: "configuration",
                id: self.config_id.to_string(),
            })
    }

    /// Apply `edit` to the stored configuration and save it.
    pub async fn edit_config(
        &self,
        edit: impl FnOnce(&mut ChatbotConfig),
    ) -> Result<(), OdoobotError> {
        let mut config = self.stored_config().await?;
        edit(&mut config);
        self.storage.update_config(&config).await
    }
}
