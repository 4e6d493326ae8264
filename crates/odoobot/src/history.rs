// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `odoobot history`, `odoobot sessions` and `odoobot stats`.

use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatMessage, MessageStats, OdoobotError, SessionSummary};
use serde::Serialize;

use crate::app::App;

/// Width of the input column in `history` output.
const INPUT_PREVIEW_CHARS: usize = 60;

fn print_json<T: Serialize>(value: &T) -> Result<(), OdoobotError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| OdoobotError::Internal(format!("failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

pub async fn run_history(
    config: &OdoobotConfig,
    session: Option<String>,
    limit: Option<u32>,
    json: bool,
) -> Result<(), OdoobotError> {
    let app = App::build(config).await?;
    let messages = app
        .service
        .history(config.operator.user_id, session.as_deref(), limit)
        .await;
    app.close().await?;
    let messages = messages?;

    if json {
        return print_json(&messages);
    }
    if messages.is_empty() {
        println!("no messages");
        return Ok(());
    }
    for message in &messages {
        println!("{}", history_line(message));
    }
    Ok(())
}

fn history_line(message: &ChatMessage) -> String {
    let flat = message.user_input.replace('\n', " ");
    let mut input = odoobot_core::truncate_chars(&flat, INPUT_PREVIEW_CHARS);
    if message.user_input.chars().count() > INPUT_PREVIEW_CHARS {
        input.push_str("...");
    }
    format!(
        "{}  {:<9}  {}  {:>6.2}s  {}",
        message.created_at,
        message.status.to_string(),
        message.session_id,
        message.response_time,
        input
    )
}

pub async fn run_sessions(config: &OdoobotConfig, json: bool) -> Result<(), OdoobotError> {
    let app = App::build(config).await?;
    let sessions = app.service.sessions(config.operator.user_id).await;
    app.close().await?;
    let sessions = sessions?;

    if json {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        println!("no sessions");
        return Ok(());
    }
    for session in &sessions {
        println!("{}", session_line(session));
    }
    Ok(())
}

fn session_line(session: &SessionSummary) -> String {
    format!(
        "{}  {}  {} message{}",
        session.session_id,
        session.last_message,
        session.message_count,
        if session.message_count == 1 { "" } else { "s" }
    )
}

pub async fn run_stats(config: &OdoobotConfig, json: bool) -> Result<(), OdoobotError> {
    let app = App::build(config).await?;
    let stats = app.service.statistics(config.operator.user_id).await;
    app.close().await?;
    let stats = stats?;

    if json {
        return print_json(&stats);
    }
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &MessageStats) {
    println!();
    println!("  odoobot stats");
    println!("  {}", "-".repeat(35));
    println!("    Messages:       {}", stats.total_messages);
    println!("    Processed:      {}", stats.processed_messages);
    println!("    Errors:         {}", stats.error_messages);
    println!("    Sessions:       {}", stats.sessions_count);
    println!("    Avg response:   {:.2}s", stats.avg_response_time);
    println!("    Success rate:   {:.1}%", stats.success_rate);
    println!();
}
