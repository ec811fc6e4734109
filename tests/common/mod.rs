//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use session_relay::config::AppConfig;
use session_relay::Session;
use tokio::net::TcpListener;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Echo the credential headers the gateway received.
async fn echo_credentials(headers: HeaderMap) -> impl IntoResponse {
    Json(json!({
        "cookie": header(&headers, "cookie"),
        "authorization": header(&headers, "authorization"),
        "request_id": header(&headers, "x-request-id"),
    }))
}

/// Mimic the gateway's current-user endpoint: requires the session cookie.
async fn me(headers: HeaderMap) -> impl IntoResponse {
    match header(&headers, "cookie") {
        Some(cookie) if cookie.contains("tg_session_token=") => Json(json!({
            "username": "testuser",
            "cookie": cookie,
            "request_id": header(&headers, "x-request-id"),
        }))
        .into_response(),
        _ => (StatusCode::UNAUTHORIZED, "no session").into_response(),
    }
}

/// Start a mock gateway on an ephemeral port and return its address.
pub async fn start_mock_gateway() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/_/me", get(me))
        .route("/admin/echo", get(echo_credentials))
        .route("/user/echo", get(echo_credentials));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// Config pointing at `gateway` with a temporary SPA directory.
pub fn test_config(gateway: SocketAddr, webapp_dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.gateway.base_url = format!("http://{}", gateway);
    config.gateway.admin_token = "admin-secret".to_string();
    config.webapp.dir = webapp_dir.display().to_string();
    config
}

/// JSON session payload as the gateway would send it.
pub fn session_header(user_id: &str, token: &str, is_admin: bool) -> String {
    serde_json::to_string(&Session {
        user_id: user_id.to_string(),
        username: format!("{}-name", user_id),
        token: token.to_string(),
        is_admin,
        ..Default::default()
    })
    .unwrap()
}
