// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `CompletionProvider` with scripted replies and
//! keeps every request it receives, so tests can assert on the conversation
//! and configuration a turn handed to the model.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use odoobot_core::types::AdapterType;
use odoobot_core::{
    CompletionProvider, CompletionRequest, CompletionResult, HealthStatus, OdoobotError,
    PluginAdapter, TokenUsage,
};

/// Usage reported with every scripted reply.
pub const MOCK_USAGE: TokenUsage = TokenUsage {
    input_tokens: 10,
    output_tokens: 5,
};

enum Reply {
    Text(String),
    Fail(OdoobotError),
}

/// A completion provider that returns scripted replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
#[derive(Clone)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given texts.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(responses.into_iter().map(Reply::Text).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(Reply::Text(text.into()));
    }

    /// Queue a failed completion.
    pub async fn add_failure(&self, error: OdoobotError) {
        self.replies.lock().await.push_back(Reply::Fail(error));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, OdoobotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OdoobotError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, OdoobotError> {
        self.requests.lock().await.push(request);
        let reply = self.replies.lock().await.pop_front();
        match reply {
            Some(Reply::Fail(e)) => Err(e),
            Some(Reply::Text(text)) => Ok(result(text)),
            None => Ok(result("mock response".to_string())),
        }
    }
}

fn result(text: String) -> CompletionResult {
    CompletionResult {
        success: true,
        text,
        usage: MOCK_USAGE,
        tool_rounds: 0,
        truncated_tool_rounds: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoobot_config::model::DefaultsConfig;
    use odoobot_core::{ConversationMessage, UserContext};

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            conversation: vec![ConversationMessage::user(text)],
            config: DefaultsConfig::default().seed_config("2026-01-01T00:00:00.000Z"),
            user: UserContext {
                user_id: 2,
                name: "Tester".into(),
                company: "Acme".into(),
                lang: None,
            },
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn replies_in_order_then_default() {
        let provider = MockProvider::with_responses(vec!["first".into()]);
        provider.add_failure(OdoobotError::NotConnected).await;

        assert_eq!(provider.complete(request("a")).await.unwrap().text, "first");
        assert!(matches!(
            provider.complete(request("b")).await,
            Err(OdoobotError::NotConnected)
        ));
        let fallback = provider.complete(request("c")).await.unwrap();
        assert_eq!(fallback.text, "mock response");
        assert_eq!(fallback.usage, MOCK_USAGE);
    }

    #[tokio::test]
    async fn captures_requests() {
        let provider = MockProvider::new();
        provider.complete(request("hello")).await.unwrap();
        let seen = provider.requests().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].conversation[0].content, "hello");
    }
}
