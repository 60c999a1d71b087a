// Demo route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::state::AppState;
use super::handler;

/// Creates router with all demo endpoints for the problem details layers
pub fn test_api_routes() -> Router<AppState> {
    Router::new()
        .route("/hello", get(handler::hello_handler))
        .route("/status", get(handler::status_handler))
        .route("/declared/{code}", get(handler::declared_status_handler))
        .route("/not-found", get(handler::not_found_test_handler))
        .route("/conflict", get(handler::conflict_test_handler))
        .route("/payment", get(handler::payment_required_handler))
        .route("/bookings", post(handler::validation_handler))
        .route("/fault", get(handler::fault_test_handler))
        .route("/panic", get(handler::panic_test_handler))
        .route("/malformed", get(handler::malformed_test_handler))
        // Sleeps past the configured timeout
        .route("/timeout", get(handler::timeout_test_handler))
        .route("/error", get(handler::error_test_handler))
        // Tests the configured body size limit
        .route("/body-size", post(handler::body_size_test_handler))
}
