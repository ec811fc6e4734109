//! HTTP client for the authentication gateway.
//!
//! # Responsibilities
//! - Build outbound requests against the gateway base URL
//! - Decorate each request with exactly one credential kind
//! - Propagate the inbound request ID downstream
//! - Map transport and status failures to typed errors

use std::time::Duration;

use axum::http::{header::ACCEPT, Extensions, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::GatewayConfig;
use crate::observability::metrics;
use crate::session::{
    forward_as_admin, ContextError, CredentialForwarder, RequestContext, X_REQUEST_ID,
};

/// Errors from gateway calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound request could not supply the credential.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Connection, timeout, or body decoding failure.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid gateway URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Context(e) => e.status_code(),
            GatewayError::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Http(_) => StatusCode::BAD_GATEWAY,
            // Auth verdicts from the gateway are the caller's verdicts too.
            GatewayError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
            {
                *status
            }
            GatewayError::Status { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Client for calls made to the gateway on a caller's behalf or as admin.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: Url,
    me_path: String,
    admin: CredentialForwarder,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            me_path: config.me_path.clone(),
            admin: forward_as_admin(config.admin_token.clone()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the caller's profile, authenticating with their session cookie.
    pub async fn current_user(&self, extensions: &Extensions) -> GatewayResult<Value> {
        self.get_json(&self.me_path, &CredentialForwarder::UserCookie, extensions)
            .await
    }

    /// GET `path` with the admin credential. Never carries a user cookie.
    pub async fn get_as_admin(&self, path: &str) -> GatewayResult<Value> {
        self.get_json(path, &self.admin, &Extensions::new()).await
    }

    /// GET `path` decorated by `forwarder` and decode the JSON body.
    pub async fn get_json(
        &self,
        path: &str,
        forwarder: &CredentialForwarder,
        extensions: &Extensions,
    ) -> GatewayResult<Value> {
        let url = self.base_url.join(path)?;
        let mut req = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build()?;

        if let Err(e) = forwarder.apply(extensions, &mut req) {
            metrics::record_gateway_call(forwarder.kind(), "credential_error");
            return Err(e.into());
        }

        let request_id = RequestContext::from_extensions(extensions)
            .ok()
            .and_then(|ctx| HeaderValue::from_str(ctx.request_id()).ok());
        if let Some(value) = request_id {
            req.headers_mut().insert(X_REQUEST_ID, value);
        }

        tracing::debug!(
            url = %req.url(),
            credential = forwarder.kind(),
            "Calling gateway"
        );

        let response = match self.client.execute(req).await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_gateway_call(forwarder.kind(), "transport_error");
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_gateway_call(forwarder.kind(), "status_error");
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        metrics::record_gateway_call(forwarder.kind(), "ok");
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_url() {
        let config = GatewayConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            GatewayClient::new(&config),
            Err(GatewayError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let unauthorized = GatewayError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);

        let server_error = GatewayError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert_eq!(server_error.status_code(), StatusCode::BAD_GATEWAY);

        let missing = GatewayError::from(ContextError::SessionUnavailable);
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_without_context_fails_before_sending() {
        // Unroutable address: reaching the network would surface as Http, not Context.
        let config = GatewayConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        let client = GatewayClient::new(&config).unwrap();

        let err = client.current_user(&Extensions::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Context(ContextError::ContextMissing)));
    }
}
