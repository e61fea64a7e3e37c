//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, metrics)
//! - Bind server to listener and stop on the shutdown signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::http::Request as HttpRequest;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::blockchain::TransferService;
use crate::config::SecurityConfig;
use crate::http::handlers;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::ApiError;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransferService>,
}

/// HTTP façade over the transfer service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a wired service.
    pub fn new(service: Arc<TransferService>, security: &SecurityConfig) -> Self {
        let router = Self::build_router(AppState { service }, security);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Only read-only routes carry a whole-request deadline. Funds-moving
    /// routes are bounded by the attempt count and per-call timeouts, so a
    /// broadcast is never abandoned halfway through the failover loop.
    fn build_router(state: AppState, security: &SecurityConfig) -> Router {
        let deadline = Duration::from_secs(security.request_timeout_secs);

        let queries = Router::new()
            .route("/health", get(handlers::health))
            .route("/balance", post(handlers::balance))
            .route_layer(middleware::from_fn_with_state(deadline, enforce_deadline));

        let transfers = Router::new()
            .route("/send", post(handlers::send))
            .route("/multisend", post(handlers::multisend))
            .route("/settle", post(handlers::settle))
            .route("/refund", post(handlers::refund));

        queries
            .merge(transfers)
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(security.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &HttpRequest<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(req.headers()),
                    method = %req.method(),
                    path = %req.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for serving from tests or embedding.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Answer with a JSON 500 once a read-only request outlives `limit`.
async fn enforce_deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::DeadlineExceeded(limit.as_secs()).into_response(),
    }
}

/// Count and time every routed request.
async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
