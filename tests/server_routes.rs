//! End-to-end routing through the full middleware stack.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use session_relay::gateway::GatewayClient;
use session_relay::http::{AppState, HttpServer};
use session_relay::storage::{MemoryUserRepository, NewUser, UserRepository};
use tower::ServiceExt;

mod common;

struct TestApp {
    router: Router,
    _webapp: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let gateway = common::start_mock_gateway().await;
    let webapp = tempfile::tempdir().unwrap();
    std::fs::write(webapp.path().join("index.html"), "<html>spa</html>").unwrap();

    let config = common::test_config(gateway, webapp.path());
    let users = Arc::new(MemoryUserRepository::new());
    users
        .create(NewUser {
            email: "ada@example.com".into(),
            username: "ada".into(),
            name: "Ada".into(),
        })
        .unwrap();

    let state = AppState::new(GatewayClient::new(&config.gateway).unwrap(), users);
    let server = HttpServer::with_state(config, state).unwrap();

    TestApp {
        router: server.router(),
        _webapp: webapp,
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method(Method::GET).uri(uri)
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app().await;

    let (status, _, body) = send(&app, get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, _, body) = send(&app, get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_secs"].as_u64().unwrap() < 10);
}

#[tokio::test]
async fn test_whoami_anonymous_is_unauthorized_with_cors() {
    let app = test_app().await;

    let (status, headers, _) = send(&app, get("/api/whoami").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_whoami_identity_only() {
    let app = test_app().await;
    let req = get("/api/whoami")
        .header("X-User-Id", "user123")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "abc-123");
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user_id"], "user123");
    assert_eq!(json["request_id"], "abc-123");
    assert!(json["is_admin"].is_null());
    assert!(json["session_expired"].is_null());
}

#[tokio::test]
async fn test_whoami_with_session() {
    let app = test_app().await;
    let req = get("/api/whoami")
        .header("X-User-Id", "user123")
        .header("X-User-Data", common::session_header("user123", "tok", true))
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["username"], "user123-name");
    assert_eq!(json["is_admin"], true);
    assert_eq!(json["session_expired"], true);
}

#[tokio::test]
async fn test_whoami_malformed_session_is_bad_gateway() {
    let app = test_app().await;
    let req = get("/api/whoami")
        .header("X-User-Id", "user123")
        .header("X-User-Data", "invalid json {{{")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("invalid session data"));
}

#[tokio::test]
async fn test_whoami_utf8_session_is_parsed() {
    let app = test_app().await;
    let raw = r#"{"UserID":"u1","Username":"jürgen","Token":"tok","City":"Zürich"}"#;
    let req = get("/api/whoami")
        .header("X-User-Id", "u1")
        .header("X-User-Data", HeaderValue::from_bytes(raw.as_bytes()).unwrap())
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["city"], "Zürich");
    assert_eq!(json["username"], "jürgen");
    // No ValidUntil in the payload, so the session is already lapsed.
    assert_eq!(json["session_expired"], true);
}

#[tokio::test]
async fn test_whoami_non_utf8_session_is_bad_gateway() {
    let app = test_app().await;
    let req = get("/api/whoami")
        .header("X-User-Id", "u1")
        .header(
            "X-User-Data",
            HeaderValue::from_bytes(b"{\"City\":\"Z\xfcrich\"}").unwrap(),
        )
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("invalid session data"));
}

#[tokio::test]
async fn test_preflight_short_circuits() {
    let app = test_app().await;
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/whoami")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send(&app, req).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
    // Context propagation never ran.
    assert!(!headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_me_forwards_session_to_gateway() {
    let app = test_app().await;
    let req = get("/api/me")
        .header("X-User-Id", "user123")
        .header("X-User-Data", common::session_header("user123", "tok-xyz", false))
        .header("X-Request-ID", "req-me")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["cookie"], "tg_session_token=tok-xyz");
    assert_eq!(json["request_id"], "req-me");
}

#[tokio::test]
async fn test_me_without_session_is_unauthorized() {
    let app = test_app().await;
    let req = get("/api/me")
        .header("X-User-Id", "user123")
        .body(Body::empty())
        .unwrap();

    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_users_requires_admin_session() {
    let app = test_app().await;

    let user = get("/api/users")
        .header("X-User-Id", "user123")
        .header("X-User-Data", common::session_header("user123", "tok", false))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = get("/api/users")
        .header("X-User-Id", "root")
        .header("X-User-Data", common::session_header("root", "tok", true))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, admin).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["username"], "ada");
}

#[tokio::test]
async fn test_unknown_api_route_is_not_spa() {
    let app = test_app().await;

    let (status, _, body) = send(&app, get("/api/nope").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!body.contains("<html>"));
}

#[tokio::test]
async fn test_spa_fallback() {
    let app = test_app().await;

    let (status, headers, body) =
        send(&app, get("/dashboard/settings").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<html>spa</html>");
    assert_eq!(headers["access-control-allow-origin"], "*");
}
