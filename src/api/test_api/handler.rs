// Demo handlers exercising every path through the problem details layers

use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::backtrace::Backtrace;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::state::AppState;
use crate::problem::{PartialProblem, ProblemEnvelope, RequestContext, ValidationErrors};
use crate::utils::fault_handler::Fault;

/// Basic hello endpoint, passed through untouched
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(_state, _body))]
pub async fn hello_handler(
    State(_state): State<AppState>,
    _body: Bytes, // Forces body reading and triggers size limits
) -> Json<Value> {
    info!("Hello endpoint called");

    Json(json!({ "version": "1.0.0", "message": "Service started successfully" }))
}

/// Returns API status and health information
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(state, _body))]
pub async fn status_handler(
    State(state): State<AppState>,
    _body: Bytes,
) -> Json<Value> {
    info!("Status endpoint called");

    Json(json!({
        "version": "1.0.0",
        "status": "healthy",
        "environment": state.environment.environment.as_ref(),
        "production": state.environment.is_production(),
    }))
}

/// Answers with the requested status and an empty body
#[instrument(fields(backtrace = ?Backtrace::capture()))]
pub async fn declared_status_handler(Path(code): Path<u16>) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status) => status,
        Err(_) => {
            warn!("Unknown status code {code}, answering 400");
            StatusCode::BAD_REQUEST
        }
    }
}

/// Returns 404 with a partial problem carrying only a detail
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(_state, _body))]
pub async fn not_found_test_handler(
    State(_state): State<AppState>,
    _body: Bytes,
) -> impl IntoResponse {
    info!("Testing deliberate 404 not found error");

    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Booking not found" })),
    )
}

/// Returns 409 with a plain text reason
#[instrument(fields(backtrace = ?Backtrace::capture()))]
pub async fn conflict_test_handler() -> impl IntoResponse {
    info!("Testing deliberate 409 conflict");

    (StatusCode::CONFLICT, "Booking was already confirmed")
}

/// Returns a fully specified partial problem with a custom member
#[instrument(fields(backtrace = ?Backtrace::capture()))]
pub async fn payment_required_handler() -> impl IntoResponse {
    info!("Testing partial problem with extensions");

    let partial: PartialProblem = PartialProblem::new()
        .with_status(StatusCode::PAYMENT_REQUIRED)
        .with_title("Insufficient balance")
        .with_detail("Your current balance is 30, but the booking costs 50.")
        .with_type("https://example.com/probs/out-of-credit")
        .with_extension("balance", 30);

    (StatusCode::PAYMENT_REQUIRED, Json(partial))
}

/// Validates a booking request, reporting every failing field
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(state, ctx, payload))]
pub async fn validation_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ProblemEnvelope> {
    let mut errors: ValidationErrors = ValidationErrors::new();

    match payload.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => errors.add("name", "The name field is required."),
    }
    match payload.get("email").and_then(Value::as_str) {
        Some(email) if email.contains('@') => {}
        _ => errors.add("email", "The email field is not a valid e-mail address."),
    }

    if !errors.is_empty() {
        info!("Rejecting booking with {} invalid field(s)", errors.len());
        return Err(state
            .problems
            .builder()
            .build_validation(&ctx, &errors, PartialProblem::new()));
    }

    Ok(Json(json!({ "accepted": true })))
}

/// Fails with an error escaping the handler
#[instrument(fields(backtrace = ?Backtrace::capture()))]
pub async fn fault_test_handler() -> Result<Json<Value>, Fault> {
    info!("Testing unhandled fault");

    Err(Fault::from(anyhow!("disk full"))
        .with_data("volume", "/var/lib/bookings"))
}

/// Panics inside the handler
#[instrument(fields(backtrace = ?Backtrace::capture()))]
pub async fn panic_test_handler() -> Json<Value> {
    info!("Testing handler panic");

    panic!("booking cache poisoned");
}

/// Declares a failure whose JSON body cannot be parsed
#[instrument(fields(backtrace = ?Backtrace::capture()))]
pub async fn malformed_test_handler() -> Response {
    info!("Testing malformed failure body");

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        [(header::CONTENT_TYPE, "application/json")],
        "{not json",
    )
        .into_response()
}

/// Endpoint that sleeps longer than timeout to test timeout middleware
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(state, _body))]
pub async fn timeout_test_handler(
    State(state): State<AppState>,
    _body: Bytes,
) -> Json<Value> {
    let timeout_seconds: u64 = state.environment.default_timeout_seconds;

    info!("Testing timeout: sleeping for {} seconds (timeout is set to {} seconds)",
          timeout_seconds + 2, timeout_seconds);

    // Sleep beyond configured timeout to trigger middleware
    tokio::time::sleep(Duration::from_secs(timeout_seconds + 2)).await;

    Json(json!({ "message": "This should not be reached due to timeout" }))
}

/// Returns a handler-rendered 500, which is passed through as is
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(_state, _body))]
pub async fn error_test_handler(
    State(_state): State<AppState>,
    _body: Bytes,
) -> impl IntoResponse {
    info!("Testing deliberate 500 error");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error_type": "deliberate_test_error",
            "test_purpose": "Validate 500 pass through"
        })),
    )
}

/// Tests body size limits by processing request body
#[instrument(fields(backtrace = ?Backtrace::capture()), skip(state, body))]
pub async fn body_size_test_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<Value> {
    let max_size: usize = state.environment.max_request_body_size;
    let body_size: usize = body.len();

    info!("Testing body size: received {} bytes (max allowed: {} bytes)",
          body_size, max_size);

    Json(json!({
        "received_body_size": body_size,
        "max_allowed_size": max_size,
    }))
}
