// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Odoobot chat assistant.
//!
//! Exposes the chat API (`/api/chatbot/*`) over axum with bearer-token auth,
//! plus an unauthenticated `/health` probe. Every request is handled by the
//! shared [`odoobot_agent::ChatService`].

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{router, start_server, GatewayState, HealthState, ServerConfig};
