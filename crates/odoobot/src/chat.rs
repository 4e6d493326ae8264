// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `odoobot chat` command implementation.
//!
//! With a message argument, sends one turn and prints the reply. Without
//! one, runs an interactive REPL with readline history that keeps a single
//! session until the user quits.

use std::io::IsTerminal;

use colored::Colorize;
use odoobot_agent::{TurnOutcome, TurnRequest};
use odoobot_config::OdoobotConfig;
use odoobot_core::OdoobotError;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::app::App;

pub async fn run_chat(
    config: &OdoobotConfig,
    message: Option<String>,
    session: Option<String>,
    html: bool,
) -> Result<(), OdoobotError> {
    let app = App::build(config).await?;
    let result = match message {
        Some(text) => send_once(&app, config, text, session, html).await,
        None => repl(&app, config, session, html).await,
    };
    app.close().await?;
    result
}

fn request(config: &OdoobotConfig, text: String, session: Option<String>, html: bool) -> TurnRequest {
    TurnRequest {
        user: config.operator.user_context(),
        user_input: text,
        session_id: session,
        fast_mode: !html,
    }
}

async fn send_once(
    app: &App,
    config: &OdoobotConfig,
    text: String,
    session: Option<String>,
    html: bool,
) -> Result<(), OdoobotError> {
    let outcome = app
        .service
        .send_message(request(config, text, session, html))
        .await?;
    print_outcome(&outcome, std::io::stdout().is_terminal());
    eprintln!("session: {}", outcome.session_id);
    if outcome.success {
        Ok(())
    } else {
        Err(OdoobotError::Internal(
            outcome.error.unwrap_or_else(|| "turn failed".to_string()),
        ))
    }
}

async fn repl(
    app: &App,
    config: &OdoobotConfig,
    mut session: Option<String>,
    html: bool,
) -> Result<(), OdoobotError> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| OdoobotError::Internal(format!("failed to initialize readline: {e}")))?;
    let use_color = std::io::stdout().is_terminal();

    println!("odoobot chat -- type /quit or press Ctrl-D to exit");
    loop {
        let prompt = if use_color {
            format!("{} ", "you>".cyan().bold())
        } else {
            "you> ".to_string()
        };
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                return Err(OdoobotError::Internal(format!("readline error: {e}")));
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "/quit" | "/exit") {
            break;
        }
        let _ = editor.add_history_entry(text);

        match app
            .service
            .send_message(request(config, text.to_string(), session.clone(), html))
            .await
        {
            Ok(outcome) => {
                session = Some(outcome.session_id.clone());
                print_outcome(&outcome, use_color);
            }
            Err(e) => print_refusal(&e, use_color),
        }
    }
    if let Some(session) = session {
        debug!(session_id = %session, "chat session ended");
    }
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome, use_color: bool) {
    if outcome.success {
        if use_color {
            println!("{} {}", "bot>".green().bold(), outcome.bot_response);
            println!("{}", format!("({:.2}s)", outcome.response_time).dimmed());
        } else {
            println!("{}", outcome.bot_response);
        }
    } else {
        let error = outcome.error.as_deref().unwrap_or("turn failed");
        if use_color {
            println!("{} {}", "error>".red().bold(), error);
        } else {
            println!("[FAIL] {error}");
        }
    }
}

fn print_refusal(error: &OdoobotError, use_color: bool) {
    let message = error.user_message();
    if use_color {
        println!("{} {}", "error>".red().bold(), message);
    } else {
        println!("[FAIL] {message}");
    }
}
