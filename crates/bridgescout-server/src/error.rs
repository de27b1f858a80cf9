//! HTTP error mapping.
//!
//! Callers never see bare engine errors: every failure renders as a JSON
//! body with a stable `error` kind and the appropriate status. Inbound
//! rate limiting returns 429 with standard `Retry-After` semantics.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use bridgescout::Error as EngineError;

/// An HTTP-renderable error.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub retry_after: Option<u64>,
}

impl ApiError {
    /// 429 with a `Retry-After` header.
    #[must_use]
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            kind: "rate_limited",
            message: "too many requests".to_string(),
            retry_after: Some(retry_after_secs),
        }
    }

    /// 404 for unknown resources.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
            retry_after: None,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let (status, kind) = match &e {
            // The enqueue precondition: the candidate must exist under the
            // calling tenant.
            EngineError::CandidateNotFound { .. } | EngineError::AccessDenied(_) => {
                (StatusCode::PRECONDITION_FAILED, "precondition_failed")
            }
            EngineError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            EngineError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let retry_after = match &e {
            EngineError::RateLimited {
                retry_after: Some(d),
                ..
            } => Some(d.as_secs().max(1)),
            _ => None,
        };
        Self {
            status,
            kind,
            message: e.to_string(),
            retry_after,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind,
            "message": self.message,
        }));
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_precondition_maps_to_412() {
        let api: ApiError = EngineError::candidate_not_found("c1").into();
        assert_eq!(api.status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(api.kind, "precondition_failed");
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let api = ApiError::rate_limited(30);
        assert_eq!(api.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(api.retry_after, Some(30));
    }
}
