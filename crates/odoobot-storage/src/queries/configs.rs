// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration record operations.
//!
//! Every write that sets `active` clears it on all other rows inside the
//! same transaction, so at most one configuration is ever active.

use std::str::FromStr;

use odoobot_core::{ChatbotConfig, ClaudeModel, OdoobotError};
use rusqlite::{params, OptionalExtension, Row, Transaction};

use crate::database::Database;

const COLUMNS: &str = "id, name, api_key, model_name, temperature, max_tokens, timeout_secs,
     mcp_server_url, mcp_connected, daily_message_limit, active, system_prompt_prefix,
     odoo_url, odoo_db, odoo_username, odoo_password, last_test_date, last_test_result,
     created_at, updated_at";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ChatbotConfig> {
    let model: String = row.get(3)?;
    let model_name = ClaudeModel::from_str(&model).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let timeout_secs: i64 = row.get(6)?;
    Ok(ChatbotConfig {
        id: row.get(0)?,
        name: row.get(1)?,
        api_key: row.get(2)?,
        model_name,
        temperature: row.get(4)?,
        max_tokens: row.get(5)?,
        timeout_secs: timeout_secs.max(0) as u64,
        mcp_server_url: row.get(7)?,
        mcp_connected: row.get(8)?,
        daily_message_limit: row.get(9)?,
        active: row.get(10)?,
        system_prompt_prefix: row.get(11)?,
        odoo_url: row.get(12)?,
        odoo_db: row.get(13)?,
        odoo_username: row.get(14)?,
        odoo_password: row.get(15)?,
        last_test_date: row.get(16)?,
        last_test_result: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}

fn select_by_id(tx: &Transaction<'_>, id: i64) -> rusqlite::Result<Option<ChatbotConfig>> {
    tx.query_row(
        &format!("SELECT {COLUMNS} FROM chatbot_configs WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

fn deactivate_others(tx: &Transaction<'_>, keep: Option<i64>) -> rusqlite::Result<usize> {
    tx.execute(
        &format!(
            "UPDATE chatbot_configs SET active = 0, updated_at = {NOW}
             WHERE active = 1 AND (?1 IS NULL OR id != ?1)"
        ),
        params![keep],
    )
}

fn insert_row(tx: &Transaction<'_>, c: &ChatbotConfig) -> rusqlite::Result<i64> {
    tx.execute(
        "INSERT INTO chatbot_configs (name, api_key, model_name, temperature, max_tokens,
             timeout_secs, mcp_server_url, mcp_connected, daily_message_limit, active,
             system_prompt_prefix, odoo_url, odoo_db, odoo_username, odoo_password,
             last_test_date, last_test_result, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)",
        params![
            c.name,
            c.api_key,
            c.model_name.to_string(),
            c.temperature,
            c.max_tokens,
            c.timeout_secs as i64,
            c.mcp_server_url,
            c.mcp_connected,
            c.daily_message_limit,
            c.active,
            c.system_prompt_prefix,
            c.odoo_url,
            c.odoo_db,
            c.odoo_username,
            c.odoo_password,
            c.last_test_date,
            c.last_test_result,
            c.created_at,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn not_found(id: i64) -> OdoobotError {
    OdoobotError::NotFound {
        entity: "configuration",
        id: id.to_string(),
    }
}

/// Insert a configuration and return its id.
pub async fn insert_config(db: &Database, config: &ChatbotConfig) -> Result<i64, OdoobotError> {
    config.validate()?;
    let config = config.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if config.active {
                deactivate_others(&tx, None)?;
            }
            let id = insert_row(&tx, &config)?;
            tx.commit()?;
            Ok(id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a configuration by id.
pub async fn get_config(db: &Database, id: i64) -> Result<Option<ChatbotConfig>, OdoobotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM chatbot_configs WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All configurations, oldest first.
pub async fn list_configs(db: &Database) -> Result<Vec<ChatbotConfig>, OdoobotError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM chatbot_configs ORDER BY id ASC"))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Overwrite every editable field of an existing configuration.
pub async fn update_config(db: &Database, config: &ChatbotConfig) -> Result<(), OdoobotError> {
    config.validate()?;
    let c = config.clone();
    let id = c.id;
    let updated = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if c.active {
                deactivate_others(&tx, Some(c.id))?;
            }
            let n = tx.execute(
                &format!(
                    "UPDATE chatbot_configs SET name = ?2, api_key = ?3, model_name = ?4,
                         temperature = ?5, max_tokens = ?6, timeout_secs = ?7,
                         mcp_server_url = ?8, mcp_connected = ?9, daily_message_limit = ?10,
                         active = ?11, system_prompt_prefix = ?12, odoo_url = ?13, odoo_db = ?14,
                         odoo_username = ?15, odoo_password = ?16, updated_at = {NOW}
                     WHERE id = ?1"
                ),
                params![
                    c.id,
                    c.name,
                    c.api_key,
                    c.model_name.to_string(),
                    c.temperature,
                    c.max_tokens,
                    c.timeout_secs as i64,
                    c.mcp_server_url,
                    c.mcp_connected,
                    c.daily_message_limit,
                    c.active,
                    c.system_prompt_prefix,
                    c.odoo_url,
                    c.odoo_db,
                    c.odoo_username,
                    c.odoo_password,
                ],
            )?;
            tx.commit()?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if updated == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Make `id` the only active configuration. Unknown ids change nothing.
pub async fn activate_config(db: &Database, id: i64) -> Result<(), OdoobotError> {
    let found = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if select_by_id(&tx, id)?.is_none() {
                return Ok(false);
            }
            deactivate_others(&tx, Some(id))?;
            tx.execute(
                &format!("UPDATE chatbot_configs SET active = 1, updated_at = {NOW} WHERE id = ?1"),
                params![id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if found { Ok(()) } else { Err(not_found(id)) }
}

/// Return the active configuration.
///
/// Without one, the oldest configuration is promoted; with no configurations
/// at all, `seed` is inserted as the active one.
pub async fn get_or_create_active_config(
    db: &Database,
    seed: &ChatbotConfig,
) -> Result<ChatbotConfig, OdoobotError> {
    let seed = ChatbotConfig {
        active: true,
        ..seed.clone()
    };
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let active = tx
                .query_row(
                    &format!("SELECT {COLUMNS} FROM chatbot_configs WHERE active = 1 LIMIT 1"),
                    [],
                    from_row,
                )
                .optional()?;
            if let Some(config) = active {
                return Ok(config);
            }

            let first: Option<i64> = tx
                .query_row("SELECT id FROM chatbot_configs ORDER BY id ASC LIMIT 1", [], |row| {
                    row.get(0)
                })
                .optional()?;
            let id = match first {
                Some(id) => {
                    tx.execute(
                        &format!(
                            "UPDATE chatbot_configs SET active = 1, updated_at = {NOW} WHERE id = ?1"
                        ),
                        params![id],
                    )?;
                    tracing::info!(config_id = id, "promoted first configuration to active");
                    id
                }
                None => {
                    let id = insert_row(&tx, &seed)?;
                    tracing::info!(config_id = id, "created default configuration");
                    id
                }
            };
            let config = select_by_id(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(config)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Store the outcome of a connection test.
pub async fn record_connection_test(
    db: &Database,
    id: i64,
    tested_at: &str,
    result: &str,
) -> Result<(), OdoobotError> {
    let tested_at = tested_at.to_string();
    let result = result.to_string();
    let n = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "UPDATE chatbot_configs SET last_test_date = ?2, last_test_result = ?3,
                         updated_at = {NOW}
                     WHERE id = ?1"
                ),
                params![id, tested_at, result],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if n == 0 { Err(not_found(id)) } else { Ok(()) }
}

/// Flip the MCP connection flag.
pub async fn set_mcp_connected(db: &Database, id: i64, connected: bool) -> Result<(), OdoobotError> {
    let n = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "UPDATE chatbot_configs SET mcp_connected = ?2, updated_at = {NOW} WHERE id = ?1"
                ),
                params![id, connected],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if n == 0 { Err(not_found(id)) } else { Ok(()) }
}
