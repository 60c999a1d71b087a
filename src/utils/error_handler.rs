// Global error handling for HTTP middleware layers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use http_body_util::LengthLimitError;
use serde_json::json;
use std::error::Error;
// tower's error type for timeouts
use tower::timeout::error::Elapsed;

use crate::utils::fault_handler::Fault;

/// Maps errors raised by tower layers to responses the problem layers understand.
///
/// Timeouts and oversized bodies are declared failures carrying a `detail`;
/// anything else is a fault for the fault handler to render.
pub async fn handle_global_error(err: BoxError) -> Response {
    // 413 if the body was too large
    if let Some(e) = find_cause::<LengthLimitError>(&*err) {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "detail": format!("Request body too large: {e}") })),
        )
            .into_response();
    }

    // 408 if the request took too long
    if let Some(e) = err.downcast_ref::<Elapsed>() {
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "detail": format!("Request timeout: {e}") })),
        )
            .into_response();
    }

    Fault::from_error(&*err).into_response()
}

/// Helper function to find specific error type in error chain
pub fn find_cause<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    let mut source: Option<&'a (dyn Error + 'static)> = Some(err);

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}
