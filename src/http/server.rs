//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all bridge handler
//! - Wire up middleware (tracing, body limit, request ID)
//! - Decode each request body and hand it to the correlator
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::bridge::Correlator;
use crate::http::decode::decode_body;
use crate::http::response::reply_response;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub correlator: Arc<Correlator>,
}

/// HTTP front door of the bridge.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that forwards every request through `correlator`.
    pub fn new(correlator: Arc<Correlator>, max_body_size: usize) -> Self {
        let state = AppState { correlator };
        Self {
            router: Self::build_router(state, max_body_size),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, max_body_size: usize) -> Router {
        // Method and path are not inspected: every request is one payload
        Router::new()
            .route("/{*path}", any(bridge_handler))
            .route("/", any(bridge_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(max_body_size)),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Bridge handler: body in, next backend message out.
async fn bridge_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let start_time = Instant::now();

    let payload = match decode_body(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "Rejecting undecodable body");
            metrics::record_request("decode_error", start_time);
            return e.into_response();
        }
    };

    tracing::debug!(bytes = payload.len(), "HTTP: {}", payload);

    match state.correlator.forward_and_await_reply(payload).await {
        Ok(reply) => {
            metrics::record_request("ok", start_time);
            reply_response(reply)
        }
        Err(e) => {
            metrics::record_request(e.outcome(), start_time);
            e.into_response()
        }
    }
}
