// Error type shared by the builder and the middleware layers

use thiserror::Error;

/// Failures raised while building, decoding or rendering problem envelopes.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// A required field was missing when calling an explicit builder overload.
    #[error("invalid argument: `{0}` is required")]
    InvalidArgument(&'static str),

    /// The downstream handler wrote a body that is not a problem document.
    #[error("malformed problem body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// Reading the downstream response body failed part-way.
    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),

    #[error("failed to serialize problem envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}
