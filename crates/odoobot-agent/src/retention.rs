// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Age-based deletion of old messages and service-call log rows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use odoobot_config::model::RetentionConfig;
use odoobot_core::{OdoobotError, StorageAdapter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub messages: usize,
    pub service_calls: usize,
}

/// Delete rows older than the configured ages, measured from now.
pub async fn sweep(
    storage: &dyn StorageAdapter,
    config: &RetentionConfig,
) -> Result<SweepReport, OdoobotError> {
    sweep_at(storage, config, Utc::now()).await
}

/// Delete rows older than the configured ages, measured from `now`.
pub async fn sweep_at(
    storage: &dyn StorageAdapter,
    config: &RetentionConfig,
    now: DateTime<Utc>,
) -> Result<SweepReport, OdoobotError> {
    let message_cutoff = now - chrono::Duration::days(i64::from(config.message_days));
    let call_cutoff = now - chrono::Duration::days(i64::from(config.service_call_days));

    let messages = storage
        .delete_messages_before(&odoobot_core::format_timestamp(message_cutoff))
        .await?;
    let service_calls = storage
        .delete_service_calls_before(&odoobot_core::format_timestamp(call_cutoff))
        .await?;

    info!(messages, service_calls, "retention sweep complete");
    Ok(SweepReport {
        messages,
        service_calls,
    })
}

/// Run [`sweep`] every `sweep_interval_secs` until `cancel` fires.
pub fn spawn_sweeper(
    storage: Arc<dyn StorageAdapter>,
    config: RetentionConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(config.sweep_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("retention sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = sweep(storage.as_ref(), &config).await {
                        warn!(error = %e, "retention sweep failed");
                    }
                }
            }
        }
    })
}
