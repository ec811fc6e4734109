//! Context propagation and CORS middleware.
//!
//! # Layer Order
//! ```text
//! inbound request
//!     → cors_middleware        (outermost; preflight answered here)
//!     → propagate_context      (builds RequestContext, request span, metrics)
//!     → handlers
//! ```
//! CORS sits outside propagation so preflights never build a context, and its
//! headers land on every response produced further in, errors included.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::config::CorsConfig;
use crate::observability::metrics;
use crate::session::context::{RequestContext, RequestHead, X_REQUEST_ID};

/// Attach a [`RequestContext`] built from the gateway headers, then run the
/// rest of the chain inside a span carrying the request ID.
///
/// Never rejects a request: missing or malformed headers leave the context
/// anonymous and defer errors to whoever asks for identity or session data.
pub async fn propagate_context(mut req: Request<Body>, next: Next) -> Response {
    let ctx = Arc::new(RequestContext::from_head(RequestHead::from(&req)));
    req.extensions_mut().insert(Arc::clone(&ctx));

    let method = req.method().clone();
    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        method = %method,
        path = %req.uri().path(),
        authenticated = ctx.is_authenticated(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(ctx.request_id()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    metrics::record_request(method.as_str(), response.status().as_u16(), ctx.elapsed());
    tracing::debug!(
        request_id = %ctx.request_id(),
        status = response.status().as_u16(),
        elapsed_ms = ctx.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Pre-encoded cross-origin header values.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl CorsHeaders {
    pub fn from_config(
        config: &CorsConfig,
    ) -> Result<Self, axum::http::header::InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(&config.allow_origin)?,
            allow_methods: HeaderValue::from_str(&config.allow_methods)?,
            allow_headers: HeaderValue::from_str(&config.allow_headers)?,
        })
    }

    fn stamp(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}

impl Default for CorsHeaders {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_methods: HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
            allow_headers: HeaderValue::from_static("Content-Type, Authorization"),
        }
    }
}

/// Stamp CORS headers on every response and answer preflights with 204.
pub async fn cors_middleware(
    State(cors): State<CorsHeaders>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        cors.stamp(response.headers_mut());
        return response;
    }

    let mut response = next.run(req).await;
    cors.stamp(response.headers_mut());
    response
}
