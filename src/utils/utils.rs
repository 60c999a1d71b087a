// Small helpers shared by the middleware layers

use serde::Serialize;
use tracing::{debug, error};

use crate::problem::envelope::ProblemEnvelope;

/// Media type written on every rewritten error response.
pub const APPLICATION_JSON: &str = "application/json";

/// Convert any `Serialize` type into a two-space-indented JSON string.
pub fn to_two_space_indented_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Logs an outgoing envelope at debug level
pub fn log_envelope(envelope: &ProblemEnvelope) {
    match to_two_space_indented_json(envelope) {
        Ok(spaced_json) => debug!("\nProblem details:\n{}", spaced_json),
        Err(err) => error!("Failed to format problem details JSON: {:?}", err),
    }
}
