// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink for the outbound service-call log.

use async_trait::async_trait;

use crate::error::OdoobotError;
use crate::types::ServiceCall;

/// Persists a record of every call made to an external service.
///
/// Callers log a failed `record` and carry on; it never fails the call
/// being recorded.
#[async_trait]
pub trait CallRecorder: Send + Sync {
    async fn record(&self, call: ServiceCall) -> Result<(), OdoobotError>;
}
