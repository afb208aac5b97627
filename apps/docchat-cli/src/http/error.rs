use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use docchat_core::error::Error;

use super::types::ErrorResponse;

pub const RETRIEVAL_FAILED: &str = "Retrieval failed, please try again.";
pub const INTERNAL_FAILURE: &str = "Something went wrong, please try again.";

/// Core errors rendered as JSON with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self { Self(e) }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self(Error::InvalidRequest(message.into())) }

    pub fn not_found(message: impl Into<String>) -> Self { Self(Error::NotFound(message.into())) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::InvalidRequest(m) | Error::UnsupportedFile(m) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(m.clone())),
            Error::NotFound(m) => (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", m.clone())),
            Error::RetrievalUnavailable(detail) => {
                error!("Retrieval unavailable: {}", detail);
                (StatusCode::SERVICE_UNAVAILABLE, ErrorResponse::new("RETRIEVAL_UNAVAILABLE", RETRIEVAL_FAILED))
            }
            // upstream and storage details stay in the log
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::internal_error(INTERNAL_FAILURE))
            }
        };
        (status, Json(body)).into_response()
    }
}
