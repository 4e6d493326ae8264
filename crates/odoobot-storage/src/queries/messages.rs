// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message operations: insert, status transitions, history, and aggregates.

use std::str::FromStr;

use odoobot_core::types::MessageCounts;
use odoobot_core::{ChatMessage, MessageResolution, MessageStatus, OdoobotError, SessionSummary};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::Database;

const COLUMNS: &str = "id, user_id, session_id, config_id, user_input, bot_response, status,
     response_time, error_message, usage_data, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let status: String = row.get(6)?;
    let status = MessageStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ChatMessage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_id: row.get(2)?,
        config_id: row.get(3)?,
        user_input: row.get(4)?,
        bot_response: row.get(5)?,
        status,
        response_time: row.get(7)?,
        error_message: row.get(8)?,
        usage_data: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Result of a guarded status update.
enum Transition {
    Applied,
    Missing,
    Rejected(String),
}

/// `status IN (...)` clause listing the statuses allowed to move to `target`.
fn predecessor_clause(target: MessageStatus) -> String {
    let allowed: Vec<String> = MessageStatus::predecessors(target)
        .iter()
        .map(|s| format!("'{s}'"))
        .collect();
    if allowed.is_empty() {
        "0".to_string()
    } else {
        format!("status IN ({})", allowed.join(", "))
    }
}

/// Run a guarded UPDATE and classify a zero-row outcome.
fn guarded_update(
    conn: &mut Connection,
    id: &str,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Transition> {
    let tx = conn.transaction()?;
    let changed = tx.execute(sql, params)?;
    let outcome = if changed > 0 {
        Transition::Applied
    } else {
        let current: Option<String> = tx
            .query_row(
                "SELECT status FROM chatbot_messages WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            Some(status) => Transition::Rejected(status),
            None => Transition::Missing,
        }
    };
    tx.commit()?;
    Ok(outcome)
}

fn check_transition(outcome: Transition, id: &str, to: MessageStatus) -> Result<(), OdoobotError> {
    match outcome {
        Transition::Applied => Ok(()),
        Transition::Missing => Err(OdoobotError::NotFound {
            entity: "message",
            id: id.to_string(),
        }),
        Transition::Rejected(from) => Err(OdoobotError::InvalidTransition {
            from,
            to: to.to_string(),
        }),
    }
}

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &ChatMessage) -> Result<(), OdoobotError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chatbot_messages (id, user_id, session_id, config_id, user_input,
                     bot_response, status, response_time, error_message, usage_data,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    msg.id,
                    msg.user_id,
                    msg.session_id,
                    msg.config_id,
                    msg.user_input,
                    msg.bot_response,
                    msg.status.to_string(),
                    msg.response_time,
                    msg.error_message,
                    msg.usage_data,
                    msg.created_at,
                    msg.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a message by id.
pub async fn get_message(db: &Database, id: &str) -> Result<Option<ChatMessage>, OdoobotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM chatbot_messages WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a message to `status`, refusing backwards moves.
pub async fn transition_message(
    db: &Database,
    id: &str,
    status: MessageStatus,
) -> Result<(), OdoobotError> {
    let owned = id.to_string();
    let outcome = db
        .connection()
        .call(move |conn| {
            let sql = format!(
                "UPDATE chatbot_messages
                 SET status = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND {}",
                predecessor_clause(status)
            );
            guarded_update(conn, &owned, &sql, params![owned, status.to_string()])
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    check_transition(outcome, id, status)
}

/// Write the terminal outcome of a turn. Finished messages are never rewritten.
pub async fn finish_message(
    db: &Database,
    id: &str,
    resolution: &MessageResolution,
) -> Result<(), OdoobotError> {
    let owned = id.to_string();
    let target = resolution.status();
    let (bot_response, error_message, response_time, usage_data) = match resolution.clone() {
        MessageResolution::Processed {
            bot_response,
            response_time,
            usage_data,
        } => (Some(bot_response), None, response_time, usage_data),
        MessageResolution::Failed {
            error_message,
            response_time,
        } => (None, Some(error_message), response_time, None),
    };
    let outcome = db
        .connection()
        .call(move |conn| {
            let sql = format!(
                "UPDATE chatbot_messages
                 SET status = ?2, bot_response = ?3, error_message = ?4, response_time = ?5,
                     usage_data = ?6, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND {}",
                predecessor_clause(target)
            );
            guarded_update(
                conn,
                &owned,
                &sql,
                params![
                    owned,
                    target.to_string(),
                    bot_response,
                    error_message,
                    response_time,
                    usage_data
                ],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    check_transition(outcome, id, target)
}

/// A user's messages, newest first, optionally limited to one session.
pub async fn recent_messages(
    db: &Database,
    user_id: i64,
    session_id: Option<&str>,
    limit: u32,
) -> Result<Vec<ChatMessage>, OdoobotError> {
    let session_id = session_id.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM chatbot_messages
                 WHERE user_id = ?1 AND (?2 IS NULL OR session_id = ?2)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, session_id, limit], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The latest `limit` processed turns of one user's session, oldest first.
pub async fn session_turns(
    db: &Database,
    user_id: i64,
    session_id: &str,
    limit: u32,
) -> Result<Vec<ChatMessage>, OdoobotError> {
    let session_id = session_id.to_string();
    let mut turns = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM chatbot_messages
                 WHERE user_id = ?1 AND session_id = ?2 AND status = 'processed'
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, session_id, limit], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    turns.reverse();
    Ok(turns)
}

/// Distinct sessions of a user with last activity and size, most recent first.
pub async fn list_sessions(db: &Database, user_id: i64) -> Result<Vec<SessionSummary>, OdoobotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, MAX(created_at) AS last_message, COUNT(*)
                 FROM chatbot_messages
                 WHERE user_id = ?1
                 GROUP BY session_id
                 ORDER BY last_message DESC, MAX(rowid) DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    last_message: row.get(1)?,
                    message_count: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Raw counters for a user's statistics.
pub async fn message_counts(db: &Database, user_id: i64) -> Result<MessageCounts, OdoobotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(status = 'processed'), 0),
                        COALESCE(SUM(status = 'error'), 0),
                        AVG(CASE WHEN status = 'processed' AND response_time > 0
                                 THEN response_time END),
                        COUNT(DISTINCT session_id)
                 FROM chatbot_messages
                 WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(MessageCounts {
                        total: row.get(0)?,
                        processed: row.get(1)?,
                        error: row.get(2)?,
                        avg_processed_response_time: row.get(3)?,
                        sessions: row.get(4)?,
                    })
                },
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages created at or after `since`, across all users.
pub async fn count_messages_since(db: &Database, since: &str) -> Result<i64, OdoobotError> {
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM chatbot_messages WHERE created_at >= ?1",
                params![since],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete messages created before `cutoff`. Returns the number removed.
pub async fn delete_messages_before(db: &Database, cutoff: &str) -> Result<usize, OdoobotError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM chatbot_messages WHERE created_at < ?1",
                params![cutoff],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
