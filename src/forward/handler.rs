//! Axum fallback handler that forwards every request to the configured
//! base URL.
//!
//! The forwarder runs in its own task and writes into a [`ChannelSink`].
//! The handler returns as soon as that sink commits, so hyper starts
//! sending the response while the body is still being relayed.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{forward_with, ChannelSink, ErrorEnvelope};
use crate::server::AppState;

pub async fn forward_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        "request received"
    );

    let (mut sink, pending) = ChannelSink::new();

    tokio::spawn(async move {
        let mut request = request;
        let start = Instant::now();
        let result =
            forward_with(&state.http_client, &mut request, &mut sink, &state.base_url).await;
        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    latency_ms,
                    "response relayed"
                );
            }
            Err(e) if e.is_committed() => {
                state.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    error = %e,
                    latency_ms,
                    "response truncated"
                );
            }
            Err(e) => {
                state.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    error = %e,
                    latency_ms,
                    "forward failed"
                );
            }
        }
    });

    match pending.await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!("forwarding task ended without committing a response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope::forward_error("forwarding task aborted")),
            )
                .into_response()
        }
    }
}
