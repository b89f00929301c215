use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{info, warn};
use crate::admission::{RejectionKind, client_key};
use crate::error::ApiError;
use crate::metrics::{BAD_REQUESTS, RATE_LIMITED, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{CompletionJob, RecommendResponse};
use crate::state::AppState;

pub async fn recommend_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RecommendResponse>, ApiError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let client = client_key(&headers, peer, state.fallback_identity);
    // unparseable bodies fail the shape check like a missing messages field
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let conversation = state.gate.admit(&client, &payload).map_err(|rejection| {
        match rejection.kind() {
            RejectionKind::RateLimited => RATE_LIMITED.inc(),
            RejectionKind::BadRequest => {
                BAD_REQUESTS.inc();
                warn!(client = %client, reason = %rejection, "rejected chat request");
            }
        }
        ApiError::from(rejection)
    })?;

    info!(client = %client, messages = conversation.len(), "chat request admitted");

    let (response_tx, response_rx) = oneshot::channel();
    let job = CompletionJob {
        conversation,
        response_tx,
    };

    state.job_tx.send(job).await
        .map_err(|_| ApiError::WorkerUnavailable)?;

    let reply = response_rx.await
        .map_err(|_| ApiError::WorkerUnavailable)??;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(Json(RecommendResponse { reply }))
}
