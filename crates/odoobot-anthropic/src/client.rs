// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`], which builds authenticated requests, maps
//! failures onto [`OdoobotError`], and logs each call to an optional
//! [`CallRecorder`]. The API key travels with each call because it belongs
//! to the stored configuration, not the deployment.

use std::sync::Arc;
use std::time::Duration;

use odoobot_config::model::AnthropicConfig;
use odoobot_core::{CallRecorder, OdoobotError, ServiceCall, ServiceKind};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, error, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Longest response excerpt carried in errors and the call log.
const MAX_BODY_CHARS: usize = 500;

/// Headers for one Messages API call.
pub fn build_headers(
    api_key: &str,
    api_version: &str,
    beta: Option<&str>,
) -> Result<HeaderMap, OdoobotError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-api-key",
        HeaderValue::from_str(api_key)
            .map_err(|e| OdoobotError::Config(format!("invalid API key header value: {e}")))?,
    );
    headers.insert(
        "anthropic-version",
        HeaderValue::from_str(api_version).map_err(|e| {
            OdoobotError::Config(format!("invalid API version header value: {e}"))
        })?,
    );
    if let Some(beta) = beta.filter(|b| !b.is_empty()) {
        headers.insert(
            "anthropic-beta",
            HeaderValue::from_str(beta).map_err(|e| {
                OdoobotError::Config(format!("invalid anthropic-beta header value: {e}"))
            })?,
        );
    }
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// HTTP client for Anthropic API communication. No retries.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    beta: Option<String>,
    recorder: Option<Arc<dyn CallRecorder>>,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("beta", &self.beta)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(config: &AnthropicConfig) -> Result<Self, OdoobotError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| OdoobotError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
            beta: config.beta.clone(),
            recorder: None,
        })
    }

    /// Log every call through `recorder`.
    pub fn with_recorder(mut self, recorder: Arc<dyn CallRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one non-streaming request, bounded by `timeout`.
    pub async fn complete_message(
        &self,
        api_key: &str,
        request: &MessageRequest,
        timeout: Duration,
    ) -> Result<MessageResponse, OdoobotError> {
        let headers = build_headers(api_key, &self.api_version, self.beta.as_deref())?;
        let result = self.send(headers, request, timeout).await;
        self.record(request, &result).await;
        result.map(|(response, _)| response)
    }

    /// Returns the parsed response and its raw body.
    async fn send(
        &self,
        headers: HeaderMap,
        request: &MessageRequest,
        timeout: Duration,
    ) -> Result<(MessageResponse, String), OdoobotError> {
        let response = self
            .http
            .post(&self.base_url)
            .headers(headers)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| OdoobotError::Transport {
                message: if e.is_timeout() {
                    format!("request timed out after {}s", timeout.as_secs())
                } else {
                    format!("HTTP request failed: {e}")
                },
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| OdoobotError::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let body = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => odoobot_core::truncate_chars(&body, MAX_BODY_CHARS),
            };
            warn!(status = %status, body = %body, "completion request rejected");
            return Err(OdoobotError::Api {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<MessageResponse>(&body) {
            Ok(parsed) => Ok((parsed, body)),
            Err(e) => {
                error!(error = %e, body = %body, "unparseable completion response");
                Err(OdoobotError::Protocol {
                    message: format!("failed to parse API response: {e}"),
                    body: Some(odoobot_core::truncate_chars(&body, MAX_BODY_CHARS)),
                })
            }
        }
    }

    async fn record(
        &self,
        request: &MessageRequest,
        result: &Result<(MessageResponse, String), OdoobotError>,
    ) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        let call = ServiceCall {
            service: ServiceKind::Anthropic,
            endpoint: self.base_url.clone(),
            request_data: serde_json::to_string(request).unwrap_or_default(),
            response_data: result
                .as_ref()
                .ok()
                .map(|(_, body)| odoobot_core::truncate_chars(body, MAX_BODY_CHARS)),
            error_message: result.as_ref().err().map(ToString::to_string),
            success: result.is_ok(),
            created_at: odoobot_core::timestamp(),
        };
        if let Err(e) = recorder.record(call).await {
            warn!(error = %e, "failed to record completion call");
        }
    }
}
