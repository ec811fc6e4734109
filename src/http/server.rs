//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, CORS, context propagation, timeout)
//! - Bind server to listener
//! - Serve the SPA for everything outside `/api`

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{middleware, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::gateway::{GatewayClient, GatewayError};
use crate::http::{handlers, spa};
use crate::session::{cors_middleware, propagate_context, CorsHeaders};
use crate::storage::{MemoryUserRepository, UserRepository};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayClient>,
    pub users: Arc<dyn UserRepository>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gateway: GatewayClient, users: Arc<dyn UserRepository>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            users,
            started_at: Instant::now(),
        }
    }
}

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invalid CORS header value: {0}")]
    Cors(#[from] axum::http::header::InvalidHeaderValue),
}

/// HTTP server for the application.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server with an in-memory user store.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let gateway = GatewayClient::new(&config.gateway)?;
        let state = AppState::new(gateway, Arc::new(MemoryUserRepository::new()));
        Self::with_state(config, state)
    }

    /// Create a server around prepared state.
    pub fn with_state(config: AppConfig, state: AppState) -> Result<Self, ServerError> {
        let cors = CorsHeaders::from_config(&config.cors)?;
        let router = Self::build_router(&config, state, cors);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers listed last run first: trace, then CORS, then context
    /// propagation, then the timeout around the handler.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, cors: CorsHeaders) -> Router {
        let api = Router::new()
            .route("/health", get(handlers::api_health))
            .route("/whoami", get(handlers::whoami))
            .route("/me", get(handlers::me))
            .route("/users", get(handlers::list_users))
            .fallback(handlers::api_not_found);

        Router::new()
            .route("/health", get(handlers::health))
            .nest("/api", api)
            .fallback_service(spa::spa_service(&config.webapp.dir))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(propagate_context))
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            gateway = %self.config.gateway.base_url,
            webapp_dir = %self.config.webapp.dir,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
