// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the chat API.
//!
//! Handles POST /api/chatbot/send_message, POST /api/chatbot/send_message_fast,
//! GET /api/chatbot/get_messages, GET /api/chatbot/sessions,
//! GET /api/chatbot/statistics and GET /health.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use odoobot_agent::{TurnOutcome, TurnRequest};
use odoobot_config::model::OperatorConfig;
use odoobot_core::{
    ChatMessage, HealthStatus, MessageStats, OdoobotError, PluginAdapter, SessionSummary,
    UserContext,
};

use crate::server::GatewayState;

/// Request body for POST /api/chatbot/send_message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub user_input: String,
    /// Continue an existing session.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub fast_mode: bool,
}

/// Request body for POST /api/chatbot/send_message_fast.
#[derive(Debug, Deserialize)]
pub struct FastMessageRequest {
    pub user_input: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Successful turn.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_id: String,
    pub session_id: String,
    pub user_input: String,
    pub bot_response: String,
    /// Seconds.
    pub response_time: f64,
    pub timestamp: String,
    /// `"fast"` for unformatted replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
}

/// Error body shared by every route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Set when the failed turn was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message_id: None,
            session_id: None,
        }
    }
}

/// Query for GET /api/chatbot/get_messages.
#[derive(Debug, Default, Deserialize)]
pub struct GetMessagesQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One stored message as returned by GET /api/chatbot/get_messages.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub session_id: String,
    pub user_input: String,
    pub bot_response: Option<String>,
    pub status: String,
    pub response_time: f64,
    pub error_message: Option<String>,
    pub timestamp: String,
}

impl From<ChatMessage> for MessageView {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            session_id: m.session_id,
            user_input: m.user_input,
            bot_response: m.bot_response,
            status: m.status.to_string(),
            response_time: m.response_time,
            error_message: m.error_message,
            timestamp: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub messages: Vec<MessageView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: MessageStats,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
}

/// HTTP status for an error that prevented a turn or read.
pub fn status_for(error: &OdoobotError) -> StatusCode {
    match error {
        OdoobotError::Validation(_) => StatusCode::BAD_REQUEST,
        OdoobotError::LimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
        OdoobotError::NotFound { .. } => StatusCode::NOT_FOUND,
        OdoobotError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &OdoobotError) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    }
    (status, Json(ErrorResponse::new(error.user_message()))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The acting user from `x-odoo-*` headers, each falling back to `operator`.
pub fn acting_user(headers: &HeaderMap, operator: &OperatorConfig) -> UserContext {
    let fallback = operator.user_context();
    UserContext {
        user_id: header_str(headers, "x-odoo-user-id")
            .and_then(|v| v.parse().ok())
            .unwrap_or(fallback.user_id),
        name: header_str(headers, "x-odoo-user-name")
            .map(str::to_string)
            .unwrap_or(fallback.name),
        company: header_str(headers, "x-odoo-company")
            .map(str::to_string)
            .unwrap_or(fallback.company),
        lang: header_str(headers, "x-odoo-lang")
            .map(str::to_string)
            .or(fallback.lang),
    }
}

async fn run_turn(state: &GatewayState, request: TurnRequest) -> Response {
    match state.service.send_message(request).await {
        Ok(outcome) => turn_response(outcome),
        Err(e) => error_response(&e),
    }
}

fn turn_response(outcome: TurnOutcome) -> Response {
    if !outcome.success {
        let body = ErrorResponse {
            success: false,
            error: outcome.error.unwrap_or_default(),
            message_id: Some(outcome.message_id),
            session_id: Some(outcome.session_id),
        };
        return (StatusCode::OK, Json(body)).into_response();
    }
    let body = SendMessageResponse {
        success: true,
        message_id: outcome.message_id,
        session_id: outcome.session_id,
        user_input: outcome.user_input,
        bot_response: outcome.bot_response,
        response_time: outcome.response_time,
        timestamp: outcome.timestamp,
        mode: outcome.fast_mode.then_some("fast"),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// POST /api/chatbot/send_message
pub async fn send_message(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    let user = acting_user(&headers, &state.operator);
    run_turn(
        &state,
        TurnRequest {
            user,
            user_input: body.user_input,
            session_id: body.session_id,
            fast_mode: body.fast_mode,
        },
    )
    .await
}

/// POST /api/chatbot/send_message_fast
///
/// Same as `send_message` with the reply returned unformatted.
pub async fn send_message_fast(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<FastMessageRequest>,
) -> Response {
    let user = acting_user(&headers, &state.operator);
    run_turn(
        &state,
        TurnRequest {
            user,
            user_input: body.user_input,
            session_id: body.session_id,
            fast_mode: true,
        },
    )
    .await
}

/// GET /api/chatbot/get_messages
pub async fn get_messages(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<GetMessagesQuery>,
) -> Response {
    let user = acting_user(&headers, &state.operator);
    let session_id = query.session_id.as_deref().filter(|s| !s.is_empty());
    match state.service.history(user.user_id, session_id, query.limit).await {
        Ok(messages) => {
            let messages: Vec<MessageView> = messages.into_iter().map(MessageView::from).collect();
            tracing::debug!(count = messages.len(), user_id = user.user_id, "messages listed");
            Json(MessagesResponse {
                success: true,
                total: messages.len(),
                messages,
            })
            .into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/chatbot/sessions
pub async fn get_sessions(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let user = acting_user(&headers, &state.operator);
    match state.service.sessions(user.user_id).await {
        Ok(sessions) => Json(SessionsResponse {
            success: true,
            sessions,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/chatbot/statistics
pub async fn get_statistics(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let user = acting_user(&headers, &state.operator);
    match state.service.statistics(user.user_id).await {
        Ok(stats) => Json(StatisticsResponse {
            success: true,
            stats,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /health
///
/// Unauthenticated. 503 when storage is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let storage = match state.service.storage().health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    let (code, status, storage) = match storage {
        HealthStatus::Healthy => (StatusCode::OK, "ok", "healthy".to_string()),
        HealthStatus::Degraded(reason) => (StatusCode::OK, "degraded", reason),
        HealthStatus::Unhealthy(reason) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", reason),
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        storage,
    };
    (code, Json(body)).into_response()
}
