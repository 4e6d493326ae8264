// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Odoobot - a Claude chat assistant for Odoo.
//!
//! This is the binary entry point: the HTTP gateway (`serve`), a terminal
//! chat, and administration commands for configurations and history.

mod app;
mod chat;
mod history;
mod manage;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use odoobot_config::OdoobotConfig;
use odoobot_core::OdoobotError;

/// Odoobot - a Claude chat assistant for Odoo.
#[derive(Parser, Debug)]
#[command(name = "odoobot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Send one message, or start an interactive chat when none is given.
    Chat {
        message: Option<String>,
        /// Continue this session.
        #[arg(long)]
        session: Option<String>,
        /// Print the HTML reply instead of plain text.
        #[arg(long)]
        html: bool,
    },
    /// Show recent messages of the operator user.
    History {
        #[arg(long)]
        session: Option<String>,
        /// Number of messages (1-100).
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// List conversation sessions of the operator user.
    Sessions {
        #[arg(long)]
        json: bool,
    },
    /// Show message statistics of the operator user.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Manage assistant configurations.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Connect the MCP server to Odoo.
    #[command(subcommand)]
    Mcp(McpCommand),
    /// Delete messages and service-call logs past their retention age.
    Cleanup,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show a configuration (the active one by default).
    Show {
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// List all configurations.
    List,
    /// Make a configuration the active one.
    Activate { id: i64 },
    /// Set one field of a configuration.
    Set {
        key: String,
        value: String,
        #[arg(long)]
        id: Option<i64>,
    },
    /// Send a probe message with a configuration and store the result.
    Test {
        #[arg(long)]
        id: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum McpCommand {
    /// Log the MCP server into Odoo with the configuration's credentials.
    Connect {
        #[arg(long)]
        id: Option<i64>,
    },
    /// Stop offering record tools to the model.
    Disconnect {
        #[arg(long)]
        id: Option<i64>,
    },
}

fn load_config(path: Option<&std::path::Path>) -> OdoobotConfig {
    let loaded = match path {
        Some(path) => odoobot_config::load_and_validate_path(path),
        None => odoobot_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            odoobot_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: OdoobotConfig) -> Result<(), OdoobotError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Chat {
            message,
            session,
            html,
        } => chat::run_chat(&config, message, session, html).await,
        Commands::History {
            session,
            limit,
            json,
        } => history::run_history(&config, session, limit, json).await,
        Commands::Sessions { json } => history::run_sessions(&config, json).await,
        Commands::Stats { json } => history::run_stats(&config, json).await,
        Commands::Config(cmd) => match cmd {
            ConfigCommand::Show { id, json } => manage::show_config(&config, id, json).await,
            ConfigCommand::List => manage::list_configs(&config).await,
            ConfigCommand::Activate { id } => manage::activate_config(&config, id).await,
            ConfigCommand::Set { key, value, id } => {
                manage::set_config(&config, id, &key, &value).await
            }
            ConfigCommand::Test { id } => manage::test_config(&config, id).await,
        },
        Commands::Mcp(cmd) => match cmd {
            McpCommand::Connect { id } => manage::mcp_connect(&config, id).await,
            McpCommand::Disconnect { id } => manage::mcp_disconnect(&config, id).await,
        },
        Commands::Cleanup => manage::cleanup(&config).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let Some(command) = cli.command else {
        println!("odoobot: use --help for available commands");
        return;
    };

    app::init_tracing(&config.agent.log_level);
    if let Err(e) = run(command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = odoobot_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "odoobot");
    }

    #[test]
    fn parses_chat_with_session() {
        let cli = Cli::try_parse_from(["odoobot", "chat", "hello", "--session", "abc"]).unwrap();
        match cli.command {
            Some(Commands::Chat {
                message, session, html,
            }) => {
                assert_eq!(message.as_deref(), Some("hello"));
                assert_eq!(session.as_deref(), Some("abc"));
                assert!(!html);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_nested_config_set() {
        let cli = Cli::try_parse_from([
            "odoobot", "--config", "/tmp/o.toml", "config", "set", "temperature", "0.2", "--id", "3",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/o.toml")));
        match cli.command {
            Some(Commands::Config(ConfigCommand::Set { key, value, id })) => {
                assert_eq!(key, "temperature");
                assert_eq!(value, "0.2");
                assert_eq!(id, Some(3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["odoobot", "frobnicate"]).is_err());
    }
}
