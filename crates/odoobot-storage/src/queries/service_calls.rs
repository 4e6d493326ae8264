// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound service-call log.

use std::str::FromStr;

use odoobot_core::{OdoobotError, ServiceCall, ServiceKind};
use rusqlite::params;

use crate::database::Database;

/// Append one call record.
pub async fn insert_service_call(db: &Database, call: &ServiceCall) -> Result<(), OdoobotError> {
    let call = call.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO service_calls (service, endpoint, request_data, response_data,
                     error_message, success, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    call.service.to_string(),
                    call.endpoint,
                    call.request_data,
                    call.response_data,
                    call.error_message,
                    call.success,
                    call.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recent calls, newest first.
pub async fn recent_service_calls(db: &Database, limit: u32) -> Result<Vec<ServiceCall>, OdoobotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT service, endpoint, request_data, response_data, error_message, success,
                        created_at
                 FROM service_calls
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let service: String = row.get(0)?;
                let service = ServiceKind::from_str(&service).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(ServiceCall {
                    service,
                    endpoint: row.get(1)?,
                    request_data: row.get(2)?,
                    response_data: row.get(3)?,
                    error_message: row.get(4)?,
                    success: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete call records created before `cutoff`.
pub async fn delete_service_calls_before(db: &Database, cutoff: &str) -> Result<usize, OdoobotError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM service_calls WHERE created_at < ?1",
                params![cutoff],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn call(service: ServiceKind, ts: &str, success: bool) -> ServiceCall {
        ServiceCall {
            service,
            endpoint: "https://example.test/search".to_string(),
            request_data: r#"{"model":"res.partner"}"#.to_string(),
            response_data: success.then(|| "[]".to_string()),
            error_message: (!success).then(|| "HTTP 500".to_string()),
            success,
            created_at: ts.to_string(),
        }
    }

    #[tokio::test]
    async fn log_read_and_prune() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("calls.db").to_str().unwrap())
            .await
            .unwrap();

        insert_service_call(&db, &call(ServiceKind::Mcp, "2026-01-01T00:00:00.000Z", true))
            .await
            .unwrap();
        insert_service_call(
            &db,
            &call(ServiceKind::Anthropic, "2026-01-05T00:00:00.000Z", false),
        )
        .await
        .unwrap();

        let recent = recent_service_calls(&db, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].service, ServiceKind::Anthropic);
        assert!(!recent[0].success);
        assert_eq!(recent[0].error_message.as_deref(), Some("HTTP 500"));

        let removed = delete_service_calls_before(&db, "2026-01-03T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(recent_service_calls(&db, 10).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }
}
