use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::models::ErrorResponse;

pub(super) const MISSING_API_KEY_MESSAGE: &str = "OpenAI API key not set.";

pub(super) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub(super) fn bad_request_response(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub(super) fn internal_error_response(message: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub(super) fn missing_api_key_response() -> Response {
    internal_error_response(MISSING_API_KEY_MESSAGE)
}

/// Upstream statuses are forwarded as-is; anything that is not a valid
/// error status becomes 502.
pub(super) fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|status| status.is_client_error() || status.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}
