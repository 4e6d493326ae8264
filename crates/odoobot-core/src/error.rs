// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Odoobot chat assistant.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum OdoobotError {
    /// Missing or malformed configuration (no API key, bad header value, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// Network failure or timeout talking to a remote service.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote service answered with a non-success HTTP status.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Remote service answered 2xx with a body we could not interpret.
    #[error("protocol error: {message}")]
    Protocol {
        message: String,
        body: Option<String>,
    },

    /// The chat model asked for a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool call was attempted without an MCP server endpoint.
    #[error("MCP server is not connected")]
    NotConnected,

    /// Input rejected before any work was done.
    #[error("validation error: {0}")]
    Validation(String),

    /// The daily message quota of the active configuration is used up.
    #[error("daily message limit of {limit} reached")]
    LimitReached { limit: u32 },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A message status change that would move backwards or out of a final state.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OdoobotError {
    /// Text suitable for showing to the end user in the chat window.
    ///
    /// Never includes response bodies, credentials, or storage internals.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration error: {msg}"),
            Self::Api { status, .. } => {
                format!("The AI service returned an error (HTTP {status}). Please try again later.")
            }
            Self::Transport { .. } => {
                "Could not reach the AI service. Please check network connectivity.".to_string()
            }
            Self::Validation(msg) => msg.clone(),
            Self::LimitReached { limit } => {
                format!("Daily message limit reached ({limit} messages). Please try again tomorrow.")
            }
            Self::NotConnected => "The MCP server is not connected.".to_string(),
            Self::NotFound { entity, .. } => format!("The requested {entity} does not exist."),
            Self::UnknownTool(_)
            | Self::Protocol { .. }
            | Self::InvalidTransition { .. }
            | Self::Storage { .. }
            | Self::Internal(_) => {
                "An unexpected error occurred while processing your message.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_api_body() {
        let err = OdoobotError::Api {
            status: 401,
            body: "{\"error\":\"secret detail\"}".into(),
        };
        let msg = err.user_message();
        assert!(msg.contains("401"));
        assert!(!msg.contains("secret detail"));
    }

    #[test]
    fn user_message_passes_validation_text_through() {
        let err = OdoobotError::Validation("Message cannot be empty".into());
        assert_eq!(err.user_message(), "Message cannot be empty");
    }

    #[test]
    fn storage_error_is_generic_for_users() {
        let err = OdoobotError::Storage {
            source: Box::new(std::io::Error::other("disk on fire")),
        };
        assert!(!err.user_message().contains("disk"));
        assert!(err.to_string().contains("disk on fire"));
    }
}
