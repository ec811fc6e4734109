//! Credential forwarding against a live mock gateway.

use std::sync::Arc;

use axum::http::Extensions;
use session_relay::config::GatewayConfig;
use session_relay::gateway::{GatewayClient, GatewayError};
use session_relay::session::{ContextError, CredentialForwarder, RequestContext};

mod common;

fn client_for(addr: std::net::SocketAddr, admin_token: &str) -> GatewayClient {
    GatewayClient::new(&GatewayConfig {
        base_url: format!("http://{}", addr),
        admin_token: admin_token.to_string(),
        ..Default::default()
    })
    .unwrap()
}

fn extensions_for(raw_session: &str, request_id: &str) -> Extensions {
    let mut ext = Extensions::new();
    ext.insert(Arc::new(RequestContext::new(
        None,
        "user123",
        raw_session,
        request_id,
    )));
    ext
}

#[tokio::test]
async fn test_current_user_forwards_session_cookie() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "admin-secret");
    let ext = extensions_for(&common::session_header("user123", "tok-abc", false), "req-42");

    let profile = client.current_user(&ext).await.unwrap();

    assert_eq!(profile["username"], "testuser");
    assert_eq!(profile["cookie"], "tg_session_token=tok-abc");
    assert_eq!(profile["request_id"], "req-42");
}

#[tokio::test]
async fn test_current_user_without_session_is_not_sent() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "admin-secret");
    let ext = extensions_for("", "req-1");

    let err = client.current_user(&ext).await.unwrap_err();
    assert!(matches!(err, GatewayError::Context(ContextError::SessionUnavailable)));
}

#[tokio::test]
async fn test_admin_call_carries_only_bearer() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "admin-secret");

    let echoed = client.get_as_admin("/admin/echo").await.unwrap();

    assert_eq!(echoed["authorization"], "Bearer admin-secret");
    assert!(echoed["cookie"].is_null());
}

#[tokio::test]
async fn test_admin_call_with_user_context_in_scope() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "admin-secret");
    let ext = extensions_for(&common::session_header("user123", "user-tok", false), "req-7");

    let echoed = client
        .get_json(
            "/admin/echo",
            &session_relay::session::forward_as_admin("admin-secret"),
            &ext,
        )
        .await
        .unwrap();

    assert_eq!(echoed["authorization"], "Bearer admin-secret");
    assert!(echoed["cookie"].is_null());
    assert_eq!(echoed["request_id"], "req-7");
}

#[tokio::test]
async fn test_admin_disabled_sends_no_credential() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "");

    let echoed = client.get_as_admin("/admin/echo").await.unwrap();

    assert!(echoed["authorization"].is_null());
    assert!(echoed["cookie"].is_null());
}

#[tokio::test]
async fn test_user_forwarder_never_sends_bearer() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "admin-secret");
    let ext = extensions_for(&common::session_header("user123", "tok", false), "");

    let echoed = client
        .get_json("/user/echo", &CredentialForwarder::UserCookie, &ext)
        .await
        .unwrap();

    assert_eq!(echoed["cookie"], "tg_session_token=tok");
    assert!(echoed["authorization"].is_null());
}

#[tokio::test]
async fn test_gateway_rejection_maps_to_status_error() {
    let addr = common::start_mock_gateway().await;
    let client = client_for(addr, "admin-secret");

    // The admin forwarder strips cookies, so the me endpoint refuses it.
    let err = client.get_as_admin("/_/me").await.unwrap_err();
    match err {
        GatewayError::Status { status, .. } => assert_eq!(status, 401),
        other => panic!("expected status error, got {:?}", other),
    }
}
