// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Odoobot integration tests.
//!
//! Provides a scripted completion provider and a harness that wires it to a
//! temp SQLite database, so turn handling can be tested without calling
//! Anthropic or an MCP server.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted completion provider that captures requests
//! - [`TestHarness`] - Chat service over temp storage and a [`MockProvider`]

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder, TEST_API_KEY};
pub use mock_provider::MockProvider;
