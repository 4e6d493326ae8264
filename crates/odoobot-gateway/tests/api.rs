// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat API routes driven through the router with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use odoobot_config::model::GatewayConfig;
use odoobot_core::OdoobotError;
use odoobot_gateway::{router, GatewayState};
use odoobot_test_utils::TestHarness;
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "gateway-test-token";

fn app(h: &TestHarness) -> Router {
    let gateway = GatewayConfig {
        bearer_token: Some(TOKEN.to_string()),
        ..GatewayConfig::default()
    };
    router(GatewayState::new(
        h.service.clone(),
        &gateway,
        &h.config.operator,
    ))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn call_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, text) = call(app, request).await;
    (status, serde_json::from_str(&text).unwrap())
}

async fn harness(responses: &[&str]) -> TestHarness {
    TestHarness::builder()
        .with_mock_responses(responses.iter().map(|s| s.to_string()).collect())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn send_message_returns_formatted_reply() {
    let h = harness(&["Found **3** leads"]).await;
    let (status, body) = call_json(
        app(&h),
        post("/api/chatbot/send_message", json!({"user_input": "Show leads"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user_input"], "Show leads");
    assert!(body["bot_response"].as_str().unwrap().contains("<strong>3</strong>"));
    assert!(body.get("mode").is_none());
    assert_eq!(body["session_id"].as_str().unwrap().len(), 12);
}

#[tokio::test]
async fn fast_route_is_unformatted_and_labelled() {
    let h = harness(&["Found **3** leads"]).await;
    let (status, body) = call_json(
        app(&h),
        post(
            "/api/chatbot/send_message_fast",
            json!({"user_input": "Show leads", "session_id": "abc"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bot_response"], "Found **3** leads");
    assert_eq!(body["mode"], "fast");
    assert_eq!(body["session_id"], "abc");
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let h = harness(&[]).await;
    let (status, text) = call(
        app(&h),
        post("/api/chatbot/send_message", json!({"user_input": "  "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    insta::assert_snapshot!(text, @r#"{"success":false,"error":"Message cannot be empty"}"#);
}

#[tokio::test]
async fn failed_turn_reports_error_with_message_id() {
    let h = harness(&[]).await;
    h.mock_provider
        .add_failure(OdoobotError::Transport {
            message: "connection refused".into(),
            source: None,
        })
        .await;

    let (status, body) = call_json(
        app(&h),
        post("/api/chatbot/send_message", json!({"user_input": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Could not reach"));
    assert!(body["message_id"].is_string());
}

#[tokio::test]
async fn daily_limit_maps_to_429() {
    let h = TestHarness::builder().with_daily_limit(1).build().await.unwrap();
    call(app(&h), post("/api/chatbot/send_message", json!({"user_input": "one"}))).await;
    let (status, body) = call_json(
        app(&h),
        post("/api/chatbot/send_message", json!({"user_input": "two"})),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn api_routes_require_token() {
    let h = harness(&[]).await;
    let request = Request::builder()
        .uri("/api/chatbot/get_messages")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app(&h), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let no_token = router(GatewayState::new(
        h.service.clone(),
        &GatewayConfig::default(),
        &h.config.operator,
    ));
    let (status, _) = call(no_token, get("/api/chatbot/get_messages")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let h = harness(&[]).await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call_json(app(&h), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn get_messages_is_scoped_to_the_acting_user() {
    let h = harness(&["a", "b", "c"]).await;
    let app = app(&h);
    for input in ["first", "second"] {
        call(
            app.clone(),
            post("/api/chatbot/send_message", json!({"user_input": input, "session_id": "s1"})),
        )
        .await;
    }
    let mut other = post("/api/chatbot/send_message", json!({"user_input": "other user"}));
    other
        .headers_mut()
        .insert("x-odoo-user-id", "99".parse().unwrap());
    call(app.clone(), other).await;

    let (status, body) = call_json(app.clone(), get("/api/chatbot/get_messages?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["messages"][0]["user_input"], "second");
    assert_eq!(body["messages"][0]["status"], "processed");

    let (_, body) = call_json(app.clone(), get("/api/chatbot/get_messages?limit=500")).await;
    assert_eq!(body["total"], 2);

    let mut as_other = get("/api/chatbot/get_messages");
    as_other
        .headers_mut()
        .insert("x-odoo-user-id", "99".parse().unwrap());
    let (_, body) = call_json(app, as_other).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["messages"][0]["user_input"], "other user");
}

#[tokio::test]
async fn sessions_and_statistics() {
    let h = harness(&["a", "b"]).await;
    let app = app(&h);
    call(
        app.clone(),
        post("/api/chatbot/send_message", json!({"user_input": "one", "session_id": "s1"})),
    )
    .await;
    call(
        app.clone(),
        post("/api/chatbot/send_message", json!({"user_input": "two", "session_id": "s2"})),
    )
    .await;

    let (status, body) = call_json(app.clone(), get("/api/chatbot/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(body["sessions"][0]["session_id"], "s2");

    let (status, body) = call_json(app, get("/api/chatbot/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_messages"], 2);
    assert_eq!(body["processed_messages"], 2);
    assert_eq!(body["success_rate"], 100.0);
}
