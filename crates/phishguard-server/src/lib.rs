//! PhishGuard Server - HTTP API server.
//!
//! A thin shell that exposes the classification pipeline to browser and
//! service callers.
//!
//! ## Endpoints
//!
//! - `POST /predict` - Classify `{"url": "..."}` and return the verdict
//! - `GET /health` - Liveness and loaded model metadata
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use phishguard_core::{classifier::RandomForest, DetectorConfig, UrlPipeline};
//! use phishguard_server::{AppState, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let model = RandomForest::load("models/url_forest.json").unwrap();
//!     let pipeline = UrlPipeline::new(DetectorConfig::default(), Arc::new(model)).unwrap();
//!     let server = Server::new(ServerConfig::default(), AppState::new(Arc::new(pipeline))).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod error;
mod handlers;
pub mod models;
pub mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use error::{ApiError, Result};
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default server host (localhost only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to (default: 5000).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    // Browser frontends call from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// The HTTP API server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a server with the given configuration and state.
    pub fn new(config: ServerConfig, state: AppState) -> std::result::Result<Self, ServerError> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Runtime(format!("invalid address: {}", e)))?;

        Ok(Self {
            router: router(state),
            addr,
        })
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server until shutdown.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        info!("Starting PhishGuard API server on {}", self.addr);

        let domain = if self.addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Allow quick restarts while old sockets sit in TIME_WAIT
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Set non-blocking for tokio
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        axum::serve(listener, self.router)
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        Ok(())
    }
}
