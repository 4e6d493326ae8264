// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat turn handling for the Odoobot chat assistant.
//!
//! [`ChatService`] is the boundary every surface (HTTP gateway, CLI) calls:
//! it resolves the active configuration, enforces the daily limit, records
//! the message lifecycle, builds the conversation from session history, and
//! renders the reply. Also hosts the HTML formatter, the retention sweep,
//! and shutdown signal handling.

pub mod format;
pub mod retention;
pub mod service;
pub mod shutdown;

pub use format::{format_error, format_response};
pub use retention::{spawn_sweeper, sweep, SweepReport};
pub use service::{ChatService, ConnectionTest, TurnOutcome, TurnRequest};
pub use shutdown::install_signal_handler;
