//! Outbound credential forwarding.
//!
//! Two decorators share one capability: [`CredentialForwarder::UserCookie`]
//! re-presents the caller's gateway session as a cookie, and
//! [`CredentialForwarder::Admin`] presents the service's own bearer token.
//! The caller picks one explicitly for every outbound call.

use std::fmt;

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    Extensions, HeaderMap, HeaderValue, Request,
};

use crate::session::context::RequestContext;
use crate::session::error::{ContextError, ContextResult};

/// Cookie name the gateway reads its session token from.
pub const SESSION_COOKIE: &str = "tg_session_token";

/// An outbound request whose headers can be decorated.
pub trait OutboundRequest {
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

impl OutboundRequest for reqwest::Request {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        reqwest::Request::headers_mut(self)
    }
}

impl<B> OutboundRequest for Request<B> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        Request::headers_mut(self)
    }
}

/// Which credential an outbound call carries.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialForwarder {
    /// Forward the current caller's session token as a cookie.
    UserCookie,
    /// Send the configured admin token and strip any cookie.
    Admin { token: String },
}

impl CredentialForwarder {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialForwarder::UserCookie => "user_cookie",
            CredentialForwarder::Admin { .. } => "admin",
        }
    }

    /// Decorate `req` with this forwarder's credential.
    ///
    /// `extensions` is the inbound request's logical context; the admin
    /// variant ignores it.
    pub fn apply<R: OutboundRequest>(
        &self,
        extensions: &Extensions,
        req: &mut R,
    ) -> ContextResult<()> {
        match self {
            CredentialForwarder::UserCookie => forward_as_user_cookie(extensions, req),
            CredentialForwarder::Admin { token } => apply_admin_token(token, req.headers_mut()),
        }
    }
}

impl fmt::Debug for CredentialForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialForwarder::UserCookie => f.write_str("UserCookie"),
            CredentialForwarder::Admin { token } if token.is_empty() => {
                f.write_str("Admin { token: <none> }")
            }
            CredentialForwarder::Admin { .. } => f.write_str("Admin { token: <redacted> }"),
        }
    }
}

/// Attach the caller's session token as the gateway session cookie.
///
/// Fails with `ContextMissing` when `extensions` carries no request context and
/// propagates session errors unchanged. Never succeeds without a credential.
pub fn forward_as_user_cookie<R: OutboundRequest>(
    extensions: &Extensions,
    req: &mut R,
) -> ContextResult<()> {
    let ctx = RequestContext::from_extensions(extensions)?;
    let session = ctx.get_session()?;
    add_cookie(req.headers_mut(), SESSION_COOKIE, &session.token)
}

/// Build a reusable admin forwarder for `token`.
///
/// An empty token sets no `Authorization` header; the cookie header is
/// stripped either way.
pub fn forward_as_admin(token: impl Into<String>) -> CredentialForwarder {
    CredentialForwarder::Admin {
        token: token.into(),
    }
}

fn apply_admin_token(token: &str, headers: &mut HeaderMap) -> ContextResult<()> {
    headers.remove(COOKIE);
    if !token.is_empty() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(())
}

/// RFC 6265 cookie-octet: visible ASCII minus `"`, `,`, `;` and `\`.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// Append `name=value` to the cookie header, joining with any existing pairs.
///
/// Existing pairs are kept byte for byte. A value that could smuggle extra
/// pairs or break the header is refused.
fn add_cookie(headers: &mut HeaderMap, name: &'static str, value: &str) -> ContextResult<()> {
    if !value.bytes().all(is_cookie_octet) {
        return Err(ContextError::InvalidCookieValue(name));
    }

    let mut joined = Vec::new();
    if let Some(existing) = headers.get(COOKIE).filter(|v| !v.is_empty()) {
        joined.extend_from_slice(existing.as_bytes());
        joined.extend_from_slice(b"; ");
    }
    joined.extend_from_slice(name.as_bytes());
    joined.push(b'=');
    joined.extend_from_slice(value.as_bytes());

    let mut value = HeaderValue::from_bytes(&joined)?;
    value.set_sensitive(true);
    headers.insert(COOKIE, value);
    Ok(())
}
