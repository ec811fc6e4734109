//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → session::middleware (CORS, RequestContext)
//!     → handlers.rs (/health, /api/*)
//!     → spa.rs (everything else)
//! ```

pub mod handlers;
pub mod server;
pub mod spa;

pub use server::{shutdown_signal, AppState, HttpServer, ServerError};
