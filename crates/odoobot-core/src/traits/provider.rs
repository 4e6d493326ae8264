// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat completion provider trait.

use async_trait::async_trait;

use crate::error::OdoobotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResult};

/// Produces an assistant reply for a conversation.
///
/// Implementations resolve any tool calls the model makes before returning,
/// so the result always carries final text.
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResult, OdoobotError>;
}
