//! Request-scoped identity propagation.
//!
//! # Data Flow
//! ```text
//! gateway headers (X-User-Id, X-User-Data, X-Request-ID)
//!     → middleware.rs (RequestContext built, stored in request extensions)
//!     → context.rs (cheap identity; session parsed lazily, once)
//!     → handlers
//!     → forward.rs (outbound call carries user cookie OR admin token)
//! ```
//!
//! # Design Decisions
//! - The gateway is trusted; nothing here re-authenticates
//! - No process-wide state; every value is request-scoped or injected
//! - Errors are typed and returned, never logged at the source

pub mod context;
pub mod error;
pub mod forward;
pub mod middleware;
pub mod types;

pub use context::{RequestContext, RequestHead, X_REQUEST_ID, X_USER_DATA, X_USER_ID};
pub use error::{ContextError, ContextResult};
pub use forward::{
    forward_as_admin, forward_as_user_cookie, CredentialForwarder, OutboundRequest, SESSION_COOKIE,
};
pub use middleware::{cors_middleware, propagate_context, CorsHeaders};
pub use types::Session;
