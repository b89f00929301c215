use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use crate::state::AppState;

// health handler
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.upstream.is_healthy() { "healthy" } else { "degraded" };

    Json(serde_json::json!({
        "status": status,
        "upstream": {
            "url": state.upstream.url,
            "healthy": state.upstream.is_healthy(),
        },
        "tracked_clients": state.gate.quotas().tracked(),
        "cached_replies": state.cache.len(),
        "tier_table": state.validator.tiers().version,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
