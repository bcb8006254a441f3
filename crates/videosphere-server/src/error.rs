//! HTTP error responses
//!
//! Every failure leaves the service as `{"detail": "..."}` with the matching
//! status. Authentication failures never say which check failed.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Detail sent when a video lookup misses
pub const VIDEO_NOT_FOUND: &str = "Video not found";
/// Detail sent when a delete misses or targets someone else's video
pub const VIDEO_NOT_FOUND_OR_NOT_AUTHORIZED: &str = "Video not found or not authorized";

/// Errors surfaced by the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No `Authorization: Bearer` header
    #[error("Not authenticated")]
    MissingCredentials,

    /// Token present but not accepted
    #[error("Could not validate credentials")]
    InvalidCredentials,

    /// Resource missing (or hidden from the caller)
    #[error("{0}")]
    NotFound(&'static str),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Map a store miss to the detail the route reports
    pub fn from_store(error: StoreError, detail: &'static str) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::NotFound(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut resp = (status, Json(json!({ "detail": self.to_string() }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            resp.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        resp
    }
}
