//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router with the relay's handlers
//! - Wire up middleware (request id, trace span, request timeout)
//! - Serve until the shutdown coordinator fires

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::FunctionRouter;
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::pipeline::TxPipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<FunctionRouter>,
    pub pipeline: Arc<TxPipeline>,
}

impl AppState {
    pub fn new(router: FunctionRouter, pipeline: Arc<TxPipeline>) -> Self {
        Self {
            router: Arc::new(router),
            pipeline,
        }
    }
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
}

impl RelayServer {
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            router: Self::build_router(state, Duration::from_secs(config.request_timeout_secs)),
        }
    }

    /// The assembled router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/api/v1/execute", post(handlers::execute))
            .route("/api/v1/account", get(handlers::account))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on `listener` until `shutdown` fires; in-flight requests drain.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
