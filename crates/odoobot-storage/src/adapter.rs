// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter and CallRecorder traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use odoobot_config::model::StorageConfig;
use odoobot_core::{
    AdapterType, CallRecorder, ChatMessage, ChatbotConfig, HealthStatus, MessageResolution,
    MessageStats, MessageStatus, OdoobotError, PluginAdapter, ServiceCall, SessionSummary,
    StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, OdoobotError> {
        self.db.get().ok_or_else(|| OdoobotError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }

    /// Most recent service calls, newest first.
    pub async fn recent_service_calls(&self, limit: u32) -> Result<Vec<ServiceCall>, OdoobotError> {
        queries::service_calls::recent_service_calls(self.db()?, limit).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, OdoobotError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await;
        Ok(match probe {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), OdoobotError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), OdoobotError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| OdoobotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), OdoobotError> {
        self.db()?.close().await?;
        debug!("storage closed");
        Ok(())
    }

    // --- Configuration records ---

    async fn insert_config(&self, config: &ChatbotConfig) -> Result<i64, OdoobotError> {
        queries::configs::insert_config(self.db()?, config).await
    }

    async fn get_config(&self, id: i64) -> Result<Option<ChatbotConfig>, OdoobotError> {
        queries::configs::get_config(self.db()?, id).await
    }

    async fn list_configs(&self) -> Result<Vec<ChatbotConfig>, OdoobotError> {
        queries::configs::list_configs(self.db()?).await
    }

    async fn update_config(&self, config: &ChatbotConfig) -> Result<(), OdoobotError> {
        queries::configs::update_config(self.db()?, config).await
    }

    async fn activate_config(&self, id: i64) -> Result<(), OdoobotError> {
        queries::configs::activate_config(self.db()?, id).await
    }

    async fn get_or_create_active_config(
        &self,
        seed: &ChatbotConfig,
    ) -> Result<ChatbotConfig, OdoobotError> {
        queries::configs::get_or_create_active_config(self.db()?, seed).await
    }

    async fn record_connection_test(
        &self,
        id: i64,
        tested_at: &str,
        result: &str,
    ) -> Result<(), OdoobotError> {
        queries::configs::record_connection_test(self.db()?, id, tested_at, result).await
    }

    async fn set_mcp_connected(&self, id: i64, connected: bool) -> Result<(), OdoobotError> {
        queries::configs::set_mcp_connected(self.db()?, id, connected).await
    }

    // --- Messages ---

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), OdoobotError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<ChatMessage>, OdoobotError> {
        queries::messages::get_message(self.db()?, id).await
    }

    async fn transition_message(
        &self,
        id: &str,
        status: MessageStatus,
    ) -> Result<(), OdoobotError> {
        queries::messages::transition_message(self.db()?, id, status).await
    }

    async fn finish_message(
        &self,
        id: &str,
        resolution: &MessageResolution,
    ) -> Result<(), OdoobotError> {
        queries::messages::finish_message(self.db()?, id, resolution).await
    }

    async fn recent_messages(
        &self,
        user_id: i64,
        session_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, OdoobotError> {
        queries::messages::recent_messages(self.db()?, user_id, session_id, limit).await
    }

    async fn session_turns(
        &self,
        user_id: i64,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, OdoobotError> {
        queries::messages::session_turns(self.db()?, user_id, session_id, limit).await
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, OdoobotError> {
        queries::messages::list_sessions(self.db()?, user_id).await
    }

    async fn message_statistics(&self, user_id: i64) -> Result<MessageStats, OdoobotError> {
        let counts = queries::messages::message_counts(self.db()?, user_id).await?;
        Ok(MessageStats::from(counts))
    }

    async fn count_messages_since(&self, since: &str) -> Result<i64, OdoobotError> {
        queries::messages::count_messages_since(self.db()?, since).await
    }

    // --- Retention ---

    async fn delete_messages_before(&self, cutoff: &str) -> Result<usize, OdoobotError> {
        queries::messages::delete_messages_before(self.db()?, cutoff).await
    }

    async fn delete_service_calls_before(&self, cutoff: &str) -> Result<usize, OdoobotError> {
        queries::service_calls::delete_service_calls_before(self.db()?, cutoff).await
    }
}

#[async_trait]
impl CallRecorder for SqliteStorage {
    async fn record(&self, call: ServiceCall) -> Result<(), OdoobotError> {
        queries::service_calls::insert_service_call(self.db()?, &call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoobot_core::ServiceKind;
    use tempfile::tempdir;

    fn storage_in(dir: &tempfile::TempDir) -> SqliteStorage {
        SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("adapter.db").to_str().unwrap().to_string(),
            wal_mode: true,
        })
    }

    #[tokio::test]
    async fn uninitialized_operations_fail() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        assert!(storage.get_config(1).await.is_err());
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn statistics_are_derived_from_counts() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        storage.initialize().await.unwrap();
        assert_eq!(
            storage.health_check().await.unwrap(),
            HealthStatus::Healthy
        );

        for (i, ok) in [true, true, false].into_iter().enumerate() {
            let id = format!("m{i}");
            let ts = format!("2026-02-01T10:00:0{i}.000Z");
            storage
                .insert_message(&ChatMessage {
                    id: id.clone(),
                    user_id: 5,
                    session_id: "abc".into(),
                    config_id: None,
                    user_input: "hi".into(),
                    bot_response: None,
                    status: MessageStatus::Sent,
                    response_time: 0.0,
                    error_message: None,
                    usage_data: None,
                    created_at: ts.clone(),
                    updated_at: ts,
                })
                .await
                .unwrap();
            let resolution = if ok {
                MessageResolution::Processed {
                    bot_response: "hello".into(),
                    response_time: 1.234 + i as f64,
                    usage_data: None,
                }
            } else {
                MessageResolution::Failed {
                    error_message: "Invalid API key".into(),
                    response_time: 0.2,
                }
            };
            storage.finish_message(&id, &resolution).await.unwrap();
        }

        let stats = storage.message_statistics(5).await.unwrap();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.processed_messages, 2);
        assert_eq!(stats.error_messages, 1);
        assert_eq!(stats.sessions_count, 1);
        assert_eq!(stats.avg_response_time, 1.73);
        assert_eq!(stats.success_rate, 66.7);
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn records_service_calls() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        storage.initialize().await.unwrap();
        storage
            .record(ServiceCall {
                service: ServiceKind::Anthropic,
                endpoint: "https://api.anthropic.com/v1/messages".into(),
                request_data: "{}".into(),
                response_data: Some("{}".into()),
                error_message: None,
                success: true,
                created_at: "2026-02-01T10:00:00.000Z".into(),
            })
            .await
            .unwrap();
        let calls = storage.recent_service_calls(5).await.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].service, ServiceKind::Anthropic);
        storage.close().await.unwrap();
    }
}
