//! Per-request identity container.
//!
//! # Responsibilities
//! - Hold the cheap identity read from the gateway header
//! - Hold the raw session payload and parse it on first demand
//! - Carry the request ID and start time for tracing
//!
//! # Design Decisions
//! - Parsing is guarded by a request-local mutex; the first successful parse
//!   is cached and shared with every later reader, concurrent or not
//! - Failed parses are never cached
//! - Construction never fails; missing or malformed headers surface as errors
//!   only when a caller asks for the data

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::http::{Extensions, HeaderMap, Method, Request, Uri, Version};
use chrono::{DateTime, Utc};

use crate::session::error::{ContextError, ContextResult};
use crate::session::types::Session;

/// Header carrying the authenticated user's identifier.
pub const X_USER_ID: &str = "x-user-id";
/// Header carrying the JSON-encoded session record.
pub const X_USER_DATA: &str = "x-user-data";
/// Header carrying a caller-supplied request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Snapshot of the inbound request line and headers.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Header value as UTF-8 text; absent and non-UTF-8 values read as empty.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
            .unwrap_or_default()
    }

    /// Header value as raw bytes, whatever their encoding.
    pub fn header_bytes(&self, name: &str) -> &[u8] {
        self.headers
            .get(name)
            .map(|v| v.as_bytes())
            .unwrap_or_default()
    }
}

impl<B> From<&Request<B>> for RequestHead {
    fn from(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            headers: req.headers().clone(),
        }
    }
}

/// Request-scoped identity, session, and tracing data.
pub struct RequestContext {
    raw_request: Option<RequestHead>,
    user_id: String,
    user_data_raw: Vec<u8>,
    is_authenticated: bool,
    request_id: String,
    request_time: DateTime<Utc>,
    started_at: Instant,
    session: Mutex<Option<Arc<Session>>>,
    parses: AtomicU32,
}

impl RequestContext {
    /// Build a context from header values.
    ///
    /// An empty `request_id` is replaced by a fresh UUID v4. An empty
    /// `user_id` leaves the context anonymous. The session payload is kept
    /// byte for byte and not inspected.
    pub fn new(
        raw_request: Option<RequestHead>,
        user_id: &str,
        user_data_raw: impl AsRef<[u8]>,
        request_id: &str,
    ) -> Self {
        let request_id = if request_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            request_id.to_string()
        };

        Self {
            raw_request,
            user_id: user_id.to_string(),
            user_data_raw: user_data_raw.as_ref().to_vec(),
            is_authenticated: !user_id.is_empty(),
            request_id,
            request_time: Utc::now(),
            started_at: Instant::now(),
            session: Mutex::new(None),
            parses: AtomicU32::new(0),
        }
    }

    /// Build a context from the gateway headers of an inbound request.
    pub fn from_head(head: RequestHead) -> Self {
        let user_id = head.header(X_USER_ID).to_string();
        let user_data = head.header_bytes(X_USER_DATA).to_vec();
        let request_id = head.header(X_REQUEST_ID).to_string();
        Self::new(Some(head), &user_id, user_data, &request_id)
    }

    /// Look up the context attached to a request's extensions.
    pub fn from_extensions(extensions: &Extensions) -> ContextResult<&RequestContext> {
        extensions
            .get::<Arc<RequestContext>>()
            .map(Arc::as_ref)
            .ok_or(ContextError::ContextMissing)
    }

    /// The authenticated user's identifier. Never parses the session.
    pub fn get_identity(&self) -> ContextResult<&str> {
        if self.user_id.is_empty() {
            return Err(ContextError::Unauthenticated);
        }
        Ok(&self.user_id)
    }

    /// The parsed session, deserialized at most once per context.
    pub fn get_session(&self) -> ContextResult<Arc<Session>> {
        // Parse state holds no partial writes, so a poisoned guard is still usable.
        let mut cached = self.session.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(session) = cached.as_ref() {
            return Ok(Arc::clone(session));
        }

        if self.user_data_raw.is_empty() {
            return Err(ContextError::SessionUnavailable);
        }

        self.parses.fetch_add(1, Ordering::Relaxed);
        let session: Session =
            serde_json::from_slice(&self.user_data_raw).map_err(ContextError::InvalidSessionData)?;

        let session = Arc::new(session);
        *cached = Some(Arc::clone(&session));
        Ok(session)
    }

    /// The cached session, if a parse has already succeeded.
    pub fn cached_session(&self) -> Option<Arc<Session>> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of deserializations performed so far.
    pub fn parse_count(&self) -> u32 {
        self.parses.load(Ordering::Relaxed)
    }

    /// The inbound request snapshot.
    pub fn get_raw_request(&self) -> ContextResult<&RequestHead> {
        self.raw_request.as_ref().ok_or(ContextError::NotAvailable)
    }

    /// Admin flag from the gateway session.
    pub fn is_admin(&self) -> ContextResult<bool> {
        Ok(self.get_session()?.is_admin)
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The session payload exactly as the gateway sent it.
    pub fn raw_session(&self) -> &[u8] {
        &self.user_data_raw
    }

    /// Wall-clock time the request entered the service.
    pub fn request_time(&self) -> DateTime<Utc> {
        self.request_time
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

// The raw payload carries the session token; keep it out of debug output.
impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("user_id", &self.user_id)
            .field("is_authenticated", &self.is_authenticated)
            .field("session_payload_len", &self.user_data_raw.len())
            .field("request_time", &self.request_time)
            .finish_non_exhaustive()
    }
}
