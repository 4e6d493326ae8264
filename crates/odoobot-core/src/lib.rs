// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Odoobot chat assistant.
//!
//! Provides the trait definitions, error type, and domain types used
//! throughout the workspace. Storage, completion, and tool adapters all
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::OdoobotError;
pub use types::{
    AdapterType, ChatMessage, ChatbotConfig, ClaudeModel, CompletionRequest, CompletionResult,
    ConversationMessage, HealthStatus, MessageResolution, MessageStats, MessageStatus,
    OdooCredentials, Role, ServiceCall, ServiceKind, SessionSummary, TokenUsage, ToolSpec,
    UserContext,
};

pub use traits::{CallRecorder, CompletionProvider, PluginAdapter, StorageAdapter, ToolExecutor};

/// Timestamp format used for every stored date (UTC, millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format `at` the way every stored timestamp is written.
pub fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current UTC time as a stored timestamp.
pub fn timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}

/// First `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
