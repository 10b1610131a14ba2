//! HTTP error response handling for the API
//!
//! Domain errors become `{detail, code}` JSON bodies. The status comes from
//! [`ToHttpStatus`] unless a handler pins it with [`bad_request`].

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors with a known cause go through Error::into_response instead
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Render any error as `400 Bad Request`, keeping its detail and code
///
/// The download endpoints report every failure as a client error.
pub fn bad_request(error: Error) -> Response {
    let api_error: ApiError = error.into();
    (StatusCode::BAD_REQUEST, Json(api_error)).into_response()
}
