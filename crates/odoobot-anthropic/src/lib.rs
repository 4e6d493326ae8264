// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude completion client for the Odoobot chat assistant.
//!
//! [`CompletionClient`] implements [`CompletionProvider`]: it sends the
//! conversation with a per-user system prompt, resolves any tool calls the
//! model makes through a [`ToolExecutor`], and returns the final text.

pub mod client;
pub mod prompt;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use odoobot_config::model::AnthropicConfig;
use odoobot_core::{
    AdapterType, CallRecorder, CompletionProvider, CompletionRequest, CompletionResult,
    HealthStatus, OdoobotError, PluginAdapter, Role, ToolExecutor,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContentBlock, ApiMessage, MessageRequest, MessageResponse, ResponseContentBlock,
    ToolChoice, ToolDefinition,
};

/// A tool call requested by the model.
struct ToolUse {
    id: String,
    name: String,
    input: Value,
}

/// Concatenated text blocks, in order, and the requested tool calls.
fn split_content(content: &[ResponseContentBlock]) -> (String, Vec<ToolUse>) {
    let mut text = String::new();
    let mut tool_uses = Vec::new();
    for block in content {
        match block {
            ResponseContentBlock::Text { text: t } => text.push_str(t),
            ResponseContentBlock::ToolUse { id, name, input } => tool_uses.push(ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            ResponseContentBlock::Unsupported => {}
        }
    }
    (text, tool_uses)
}

/// Claude completion provider with bounded tool-use continuation.
pub struct CompletionClient {
    client: AnthropicClient,
    tools: Option<Arc<dyn ToolExecutor>>,
    max_continuations: u32,
}

impl CompletionClient {
    /// Build from the `[anthropic]` section, optionally logging calls.
    pub fn new(
        config: &AnthropicConfig,
        recorder: Option<Arc<dyn CallRecorder>>,
    ) -> Result<Self, OdoobotError> {
        let mut client = AnthropicClient::new(config)?;
        if let Some(recorder) = recorder {
            client = client.with_recorder(recorder);
        }
        info!(base_url = %config.base_url, "Anthropic completion client initialized");
        Ok(Self {
            client,
            tools: None,
            max_continuations: config.max_continuations.max(1),
        })
    }

    /// Offer tools to the model when the configuration has a connected MCP server.
    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    fn to_message_request(&self, request: &CompletionRequest, tools_on: bool) -> MessageRequest {
        let config = &request.config;
        let messages = request
            .conversation
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                ApiMessage::text(role, m.content.clone())
            })
            .collect();

        let tools = self
            .tools
            .as_ref()
            .filter(|_| tools_on)
            .map(|executor| {
                executor
                    .tool_definitions()
                    .into_iter()
                    .map(ToolDefinition::from)
                    .collect::<Vec<_>>()
            });
        let tool_choice = tools.as_ref().map(|_| ToolChoice::Auto);

        MessageRequest {
            model: config.model_name.to_string(),
            messages,
            system: Some(prompt::build_system_prompt(
                &request.user,
                config.system_prompt_prefix.as_deref(),
                tools_on,
            )),
            max_tokens: request.max_tokens.unwrap_or(config.max_tokens),
            temperature: request.temperature.unwrap_or(config.temperature),
            tools,
            tool_choice,
        }
    }

    /// Run each tool call in order. Failures become error results.
    async fn run_tools(&self, tool_uses: &[ToolUse], endpoint: Option<&str>) -> Vec<ApiContentBlock> {
        let mut results = Vec::with_capacity(tool_uses.len());
        for call in tool_uses {
            let outcome = match &self.tools {
                Some(executor) => executor.execute(&call.name, &call.input, endpoint).await,
                None => Err(OdoobotError::NotConnected),
            };
            let block = match outcome {
                Ok(value) => ApiContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: value.to_string(),
                    is_error: None,
                },
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool execution failed");
                    ApiContentBlock::ToolResult {
                        tool_use_id: call.id.clone(),
                        content: format!("Error: {e}"),
                        is_error: Some(true),
                    }
                }
            };
            results.push(block);
        }
        results
    }
}

fn finish(response: MessageResponse, text: String, rounds: u32, truncated: bool) -> CompletionResult {
    CompletionResult {
        success: true,
        text,
        usage: response.usage.into(),
        tool_rounds: rounds,
        truncated_tool_rounds: truncated,
    }
}

#[async_trait]
impl PluginAdapter for CompletionClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, OdoobotError> {
        // A real probe would spend tokens; connection tests cover that.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OdoobotError> {
        debug!("Anthropic completion client shutting down");
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, OdoobotError> {
        let api_key = request
            .config
            .api_key()
            .ok_or_else(|| {
                OdoobotError::Config(
                    "Anthropic API key is not configured. Please set it in the configuration."
                        .into(),
                )
            })?
            .to_string();

        let tools_on = self.tools.is_some() && request.config.tools_enabled();
        let endpoint = request.config.mcp_endpoint().map(str::to_string);
        let timeout = Duration::from_secs(request.config.timeout_secs.max(1));
        let mut api_request = self.to_message_request(&request, tools_on);

        let mut response = self
            .client
            .complete_message(&api_key, &api_request, timeout)
            .await?;
        let mut rounds = 0;

        loop {
            let (text, tool_uses) = split_content(&response.content);
            if tool_uses.is_empty() {
                return Ok(finish(response, text, rounds, false));
            }
            if rounds >= self.max_continuations {
                warn!(
                    rounds,
                    pending_tools = tool_uses.len(),
                    "continuation limit reached with tool calls outstanding"
                );
                return Ok(finish(response, text, rounds, true));
            }

            debug!(count = tool_uses.len(), round = rounds + 1, "dispatching tool calls");
            let results = self.run_tools(&tool_uses, endpoint.as_deref()).await;

            let assistant_blocks = response
                .content
                .iter()
                .filter_map(ResponseContentBlock::to_request_block)
                .collect();
            api_request
                .messages
                .push(ApiMessage::blocks("assistant", assistant_blocks));
            api_request.messages.push(ApiMessage::blocks("user", results));

            response = self
                .client
                .complete_message(&api_key, &api_request, timeout)
                .await?;
            rounds += 1;
        }
    }
}
