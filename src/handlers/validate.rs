use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::info;
use crate::metrics::{INCOMPATIBLE_BUILDS, VALIDATIONS};
use crate::models::{ValidateRequest, ValidateResponse};
use crate::state::AppState;

pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    VALIDATIONS.inc();

    let (components, budget) = payload.into_parts();
    let report = state.validator.validate(&components);
    let summary = state.validator.summarize(&components, budget);
    let compatible = report.is_compatible();

    if !compatible {
        INCOMPATIBLE_BUILDS.inc();
    }
    info!(parts = components.len(), compatible, "build validated");

    Json(ValidateResponse {
        report,
        compatible,
        summary,
    })
}
