//! Downstream gateway integration.
//!
//! # Data Flow
//! ```text
//! handler (holds inbound Extensions)
//!     → client.rs (build request against base URL)
//!     → session::forward (user cookie OR admin bearer, chosen per call)
//!     → gateway
//! ```

pub mod client;

pub use client::{GatewayClient, GatewayError, GatewayResult};
