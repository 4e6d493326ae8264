// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use odoobot_agent::ChatService;
use odoobot_config::model::{GatewayConfig, OperatorConfig};
use odoobot_core::OdoobotError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// State for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<ChatService>,
    /// Fallback acting user for requests without `x-odoo-*` headers.
    pub operator: OperatorConfig,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(service: Arc<ChatService>, gateway: &GatewayConfig, operator: &OperatorConfig) -> Self {
        Self {
            service,
            operator: operator.clone(),
            auth: AuthConfig {
                bearer_token: gateway.bearer_token.clone(),
            },
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        }
    }
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Build the application router:
/// - GET /health (no auth)
/// - POST /api/chatbot/send_message, /api/chatbot/send_message_fast
/// - GET /api/chatbot/get_messages, /api/chatbot/sessions, /api/chatbot/statistics
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/chatbot/send_message", post(handlers::send_message))
        .route(
            "/api/chatbot/send_message_fast",
            post(handlers::send_message_fast),
        )
        .route("/api/chatbot/get_messages", get(handlers::get_messages))
        .route("/api/chatbot/sessions", get(handlers::get_sessions))
        .route("/api/chatbot/statistics", get(handlers::get_statistics))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the gateway until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), OdoobotError> {
    if state.auth.bearer_token.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("gateway.bearer_token is not set; all /api routes will return 401");
    }
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OdoobotError::Transport {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| OdoobotError::Transport {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
