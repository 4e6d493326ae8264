// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Long-lived adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod provider;
pub mod recorder;
pub mod storage;
pub mod tool;

pub use adapter::PluginAdapter;
pub use provider::CompletionProvider;
pub use recorder::CallRecorder;
pub use storage::StorageAdapter;
pub use tool::ToolExecutor;
