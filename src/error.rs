use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::admission::{Rejection, RejectionKind};

// Failures talking to the completion upstream
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Upstream returned an empty reply")]
    EmptyReply,
}

// Everything a handler can fail with, rendered as {"error": "..."}
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("Completion worker is unavailable")]
    WorkerUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(r) => match r.kind() {
                RejectionKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                RejectionKind::BadRequest => StatusCode::BAD_REQUEST,
            },
            ApiError::Completion(_) => StatusCode::BAD_GATEWAY,
            ApiError::WorkerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rejections_to_status() {
        assert_eq!(
            ApiError::from(Rejection::RateLimited).into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(Rejection::InvalidRole).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_failures_are_gateway_errors() {
        let err = ApiError::from(CompletionError::Status {
            status: 401,
            body: "bad key".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Upstream returned 401: bad key");
        assert_eq!(ApiError::WorkerUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn message_passes_through_unchanged() {
        assert_eq!(
            ApiError::from(Rejection::EmptyContent).to_string(),
            "Message content must be a non-empty string"
        );
    }
}
