// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the MCP server's JSON routes.
//!
//! Every route is a single JSON POST under the server's base URL. One request
//! per call, bounded by the configured timeout, no retries.

use std::sync::Arc;
use std::time::Duration;

use odoobot_core::{CallRecorder, OdooCredentials, OdoobotError, ServiceCall, ServiceKind};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::tools::{ReadRecordInput, SearchRecordsInput};

/// Longest response excerpt carried in errors and the call log.
const MAX_BODY_CHARS: usize = 500;

const CONNECTED_MESSAGE: &str = "MCP successfully connected to Odoo!";

/// Client for one deployment; the server URL is passed per call.
#[derive(Clone)]
pub struct McpClient {
    http: reqwest::Client,
    recorder: Option<Arc<dyn CallRecorder>>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("recording", &self.recorder.is_some())
            .finish()
    }
}

impl McpClient {
    pub fn new(timeout: Duration) -> Result<Self, OdoobotError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| OdoobotError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            recorder: None,
        })
    }

    /// Log every call through `recorder`.
    pub fn with_recorder(mut self, recorder: Arc<dyn CallRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// POST `{endpoint}/search`.
    pub async fn search(
        &self,
        endpoint: &str,
        input: &SearchRecordsInput,
    ) -> Result<Value, OdoobotError> {
        let payload = serde_json::to_value(input).map_err(|e| OdoobotError::Internal(e.to_string()))?;
        self.exchange(endpoint, "search", &payload, &payload).await
    }

    /// POST `{endpoint}/read`.
    pub async fn read(&self, endpoint: &str, input: &ReadRecordInput) -> Result<Value, OdoobotError> {
        let payload = input.payload();
        self.exchange(endpoint, "read", &payload, &payload).await
    }

    /// Ask the server to log into Odoo with `credentials`.
    ///
    /// Returns the server's confirmation message.
    pub async fn connect(
        &self,
        endpoint: &str,
        credentials: &OdooCredentials,
    ) -> Result<String, OdoobotError> {
        let payload = json!({
            "url": credentials.url.trim_end_matches('/'),
            "database": credentials.database,
            "username": credentials.username,
            "password": credentials.password,
        });
        let mut logged = payload.clone();
        logged["password"] = json!("[redacted]");

        let reply = self.exchange(endpoint, "connect", &payload, &logged).await?;
        let accepted = reply.get("status").and_then(Value::as_str) == Some("success")
            || reply.get("connected").and_then(Value::as_bool) == Some(true);
        if accepted {
            return Ok(reply
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(CONNECTED_MESSAGE)
                .to_string());
        }

        let reason = reply
            .get("error")
            .or_else(|| reply.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Connection failed");
        Err(OdoobotError::Protocol {
            message: format!("MCP connection failed: {reason}"),
            body: Some(odoobot_core::truncate_chars(&reply.to_string(), MAX_BODY_CHARS)),
        })
    }

    /// Send `payload`, record the call with `logged` as its request data.
    async fn exchange(
        &self,
        endpoint: &str,
        route: &str,
        payload: &Value,
        logged: &Value,
    ) -> Result<Value, OdoobotError> {
        let url = route_url(endpoint, route)?;
        debug!(url = %url, "MCP request");
        let result = self.send(&url, payload).await;
        if let Err(e) = &result {
            warn!(url = %url, error = %e, "MCP request failed");
        }
        self.record(&url, logged, &result).await;
        result
    }

    async fn send(&self, url: &str, payload: &Value) -> Result<Value, OdoobotError> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| OdoobotError::Transport {
                message: format!("MCP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| OdoobotError::Transport {
            message: format!("failed to read MCP response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(OdoobotError::Api {
                status: status.as_u16(),
                body: odoobot_core::truncate_chars(&body, MAX_BODY_CHARS),
            });
        }

        serde_json::from_str(&body).map_err(|e| OdoobotError::Protocol {
            message: format!("MCP server returned a non-JSON body: {e}"),
            body: Some(odoobot_core::truncate_chars(&body, MAX_BODY_CHARS)),
        })
    }

    async fn record(&self, url: &str, request: &Value, result: &Result<Value, OdoobotError>) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        let call = ServiceCall {
            service: ServiceKind::Mcp,
            endpoint: url.to_string(),
            request_data: request.to_string(),
            response_data: result
                .as_ref()
                .ok()
                .map(|v| odoobot_core::truncate_chars(&v.to_string(), MAX_BODY_CHARS)),
            error_message: result.as_ref().err().map(ToString::to_string),
            success: result.is_ok(),
            created_at: odoobot_core::timestamp(),
        };
        if let Err(e) = recorder.record(call).await {
            warn!(error = %e, "failed to record MCP call");
        }
    }
}

/// `{endpoint}/{route}`, with surrounding whitespace and trailing slashes removed.
pub fn route_url(endpoint: &str, route: &str) -> Result<String, OdoobotError> {
    let base = endpoint.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(OdoobotError::NotConnected);
    }
    Ok(format!("{base}/{route}"))
}
