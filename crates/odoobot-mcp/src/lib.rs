// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP server tool executor for the Odoobot chat assistant.
//!
//! Implements [`ToolExecutor`] for the two record tools the chat model may
//! call, `search_records` and `read_record`, by forwarding them to the
//! MCP server's HTTP routes.

pub mod client;
pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use odoobot_config::model::McpConfig;
use odoobot_core::{
    AdapterType, CallRecorder, HealthStatus, OdoobotError, PluginAdapter, ToolExecutor, ToolSpec,
};
use serde_json::Value;
use tracing::debug;

pub use client::McpClient;
use tools::{ReadRecordInput, SearchRecordsInput, READ_RECORD, SEARCH_RECORDS};

/// Dispatches record tools to an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolExecutor {
    client: McpClient,
}

impl McpToolExecutor {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }

    /// Build from the `[mcp]` section, optionally logging calls.
    pub fn from_config(
        config: &McpConfig,
        recorder: Option<Arc<dyn CallRecorder>>,
    ) -> Result<Self, OdoobotError> {
        let mut client = McpClient::new(Duration::from_secs(config.timeout_secs))?;
        if let Some(recorder) = recorder {
            client = client.with_recorder(recorder);
        }
        Ok(Self::new(client))
    }

    /// The underlying HTTP client, for non-tool routes such as `connect`.
    pub fn client(&self) -> &McpClient {
        &self.client
    }
}

#[async_trait]
impl PluginAdapter for McpToolExecutor {
    fn name(&self) -> &str {
        "mcp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ToolExecutor
    }

    async fn health_check(&self) -> Result<HealthStatus, OdoobotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OdoobotError> {
        Ok(())
    }
}

#[async_trait]
impl ToolExecutor for McpToolExecutor {
    fn tool_definitions(&self) -> Vec<ToolSpec> {
        tools::tool_specs()
    }

    async fn execute(
        &self,
        tool_name: &str,
        input: &Value,
        endpoint: Option<&str>,
    ) -> Result<Value, OdoobotError> {
        if tool_name != SEARCH_RECORDS && tool_name != READ_RECORD {
            return Err(OdoobotError::UnknownTool(tool_name.to_string()));
        }
        let endpoint = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(OdoobotError::NotConnected)?;

        debug!(tool = tool_name, "executing tool");
        if tool_name == SEARCH_RECORDS {
            let input = SearchRecordsInput::from_value(input)?;
            self.client.search(endpoint, &input).await
        } else {
            let input = ReadRecordInput::from_value(input)?;
            self.client.read(endpoint, &input).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor() -> McpToolExecutor {
        McpToolExecutor::from_config(&McpConfig { timeout_secs: 5 }, None).unwrap()
    }

    #[tokio::test]
    async fn search_posts_defaults_to_search_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "model": "crm.lead",
                "domain": [],
                "fields": ["name", "id"],
                "limit": 1,
                "order": "create_date desc"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "name": "Big deal"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/", server.uri());
        let result = executor()
            .execute(
                SEARCH_RECORDS,
                &json!({"model": "crm.lead", "limit": 1, "order": "create_date desc"}),
                Some(&endpoint),
            )
            .await
            .unwrap();
        assert_eq!(result[0]["name"], "Big deal");
    }

    #[tokio::test]
    async fn read_posts_ids_to_read_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/read"))
            .and(body_json(json!({
                "model": "res.partner",
                "ids": [3],
                "fields": ["name", "email"]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 3, "name": "Azure", "email": "a@b.c"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = executor()
            .execute(
                READ_RECORD,
                &json!({"model": "res.partner", "record_id": 3, "fields": ["name", "email"]}),
                Some(&server.uri()),
            )
            .await
            .unwrap();
        assert_eq!(result[0]["email"], "a@b.c");
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_io() {
        let err = executor()
            .execute("delete_record", &json!({}), Some("http://127.0.0.1:9"))
            .await
            .unwrap_err();
        assert!(matches!(err, OdoobotError::UnknownTool(ref name) if name == "delete_record"));
    }

    #[tokio::test]
    async fn missing_endpoint_is_not_connected() {
        for endpoint in [None, Some(""), Some("   ")] {
            let err = executor()
                .execute(SEARCH_RECORDS, &json!({"model": "crm.lead"}), endpoint)
                .await
                .unwrap_err();
            assert!(matches!(err, OdoobotError::NotConnected));
        }
    }

    #[tokio::test]
    async fn server_error_status_maps_to_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("odoo down"))
            .mount(&server)
            .await;

        let err = executor()
            .execute(SEARCH_RECORDS, &json!({"model": "crm.lead"}), Some(&server.uri()))
            .await
            .unwrap_err();
        match err {
            OdoobotError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "odoo down");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_maps_to_protocol() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = executor()
            .execute(SEARCH_RECORDS, &json!({"model": "crm.lead"}), Some(&server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, OdoobotError::Protocol { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_transport() {
        // Port 9 (discard) is not listening in the test environment.
        let err = executor()
            .execute(
                SEARCH_RECORDS,
                &json!({"model": "crm.lead"}),
                Some("http://127.0.0.1:9"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OdoobotError::Transport { .. }));
    }

    #[tokio::test]
    async fn invalid_input_is_validation_error() {
        let err = executor()
            .execute(READ_RECORD, &json!({"model": "res.partner"}), Some("http://127.0.0.1:9"))
            .await
            .unwrap_err();
        assert!(matches!(err, OdoobotError::Validation(_)));
    }
}
