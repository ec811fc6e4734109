//! Route handlers.
//!
//! Handlers are the boundary where context errors get logged: the session
//! layer only returns them.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::server::AppState;
use crate::session::{ContextError, RequestContext};
use crate::storage::User;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: String,
    pub request_id: String,
    /// Present only when the gateway supplied a session.
    pub username: Option<String>,
    pub city: Option<String>,
    pub is_admin: Option<bool>,
    /// Whether the gateway session had lapsed when this request arrived.
    pub session_expired: Option<bool>,
}

fn reject(ctx: &RequestContext, err: ContextError) -> Response {
    match &err {
        ContextError::InvalidSessionData(source) => tracing::warn!(
            request_id = %ctx.request_id(),
            error = %source,
            "Gateway sent an unreadable session payload"
        ),
        other => tracing::debug!(request_id = %ctx.request_id(), error = %other, "Request rejected"),
    }
    err.into_response()
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

pub async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = state.started_at.elapsed();
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: format!("{:?}", uptime),
        uptime_secs: uptime.as_secs(),
    })
}

/// Identity as seen by this service. Parses the session only if one was sent.
pub async fn whoami(Extension(ctx): Extension<Arc<RequestContext>>) -> Response {
    let user_id = match ctx.get_identity() {
        Ok(id) => id.to_string(),
        Err(e) => return reject(&ctx, e),
    };

    let session = match ctx.get_session() {
        Ok(session) => Some(session),
        Err(ContextError::SessionUnavailable) => None,
        Err(e) => return reject(&ctx, e),
    };

    Json(WhoAmI {
        user_id,
        request_id: ctx.request_id().to_string(),
        username: session.as_ref().map(|s| s.username.clone()),
        city: session.as_ref().map(|s| s.city.clone()),
        is_admin: session.as_ref().map(|s| s.is_admin),
        session_expired: session
            .as_ref()
            .map(|s| s.is_expired_at(ctx.request_time())),
    })
    .into_response()
}

/// Current user profile, fetched from the gateway with the caller's session.
pub async fn me(State(state): State<AppState>, req: Request<Body>) -> Response {
    match state.gateway.current_user(req.extensions()).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => {
            let request_id = RequestContext::from_extensions(req.extensions())
                .map(|ctx| ctx.request_id().to_string())
                .unwrap_or_default();
            tracing::warn!(request_id = %request_id, error = %e, "Gateway profile lookup failed");
            e.into_response()
        }
    }
}

/// All stored users. Admin sessions only.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<RequestContext>>,
) -> Response {
    if let Err(e) = ctx.get_identity() {
        return reject(&ctx, e);
    }
    match ctx.is_admin() {
        Ok(true) => {}
        Ok(false) => return (StatusCode::FORBIDDEN, "admin session required").into_response(),
        Err(e) => return reject(&ctx, e),
    }

    match state.users.list() {
        Ok(users) => Json::<Vec<User>>(users).into_response(),
        Err(e) => {
            tracing::error!(request_id = %ctx.request_id(), error = %e, "Listing users failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Unknown API routes never fall through to the SPA.
pub async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
