// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `odoobot serve` command implementation.
//!
//! Starts the HTTP gateway over SQLite storage, the Anthropic completion
//! client with MCP record tools, and the background retention sweep.
//! SIGINT/SIGTERM stop the gateway and the sweeper.

use odoobot_agent::{install_signal_handler, spawn_sweeper};
use odoobot_config::OdoobotConfig;
use odoobot_core::OdoobotError;
use odoobot_gateway::{start_server, GatewayState, ServerConfig};
use tracing::{info, warn};

use crate::app::App;

pub async fn run_serve(config: OdoobotConfig) -> Result<(), OdoobotError> {
    info!(name = %config.agent.name, "starting odoobot serve");

    let app = App::build(&config).await?;
    let active = app.service.active_config().await?;
    if active.api_key().is_none() {
        warn!(
            config_id = active.id,
            "active configuration has no Anthropic API key; set one with `odoobot config set api_key ...`"
        );
    }
    info!(
        config_id = active.id,
        model = %active.model_name,
        tools = active.tools_enabled(),
        "active configuration loaded"
    );

    let cancel = install_signal_handler();
    let sweeper = spawn_sweeper(
        app.storage.clone(),
        config.retention.clone(),
        cancel.clone(),
    );

    let state = GatewayState::new(app.service.clone(), &config.gateway, &config.operator);
    let served = start_server(&ServerConfig::from(&config.gateway), state, cancel.clone()).await;

    // Stop the sweeper as well when the server exits on its own.
    cancel.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "retention sweeper task failed");
    }
    app.close().await?;

    info!("odoobot serve shutdown complete");
    served
}
