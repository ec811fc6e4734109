//! Identity propagation service sitting behind an authentication gateway.

pub mod config;
pub mod gateway;
pub mod http;
pub mod observability;
pub mod session;
pub mod storage;

pub use config::AppConfig;
pub use http::HttpServer;
pub use session::{RequestContext, Session};
