// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool executor trait.

use async_trait::async_trait;

use crate::error::OdoobotError;
use crate::types::ToolSpec;

/// Executes named tools requested by the chat model.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools to declare on the chat request.
    fn tool_definitions(&self) -> Vec<ToolSpec>;

    /// Run `tool_name` against the server at `endpoint`.
    ///
    /// Fails with [`OdoobotError::NotConnected`] when `endpoint` is absent and
    /// with [`OdoobotError::UnknownTool`] for names outside
    /// [`tool_definitions`](Self::tool_definitions).
    async fn execute(
        &self,
        tool_name: &str,
        input: &serde_json::Value,
        endpoint: Option<&str>,
    ) -> Result<serde_json::Value, OdoobotError>;
}
