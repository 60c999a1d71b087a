// Response interceptor: buffers every downstream response and rewrites failures
// into problem envelopes, leaving successful responses byte-for-byte intact

use std::panic::AssertUnwindSafe;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{
        header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, ETAG},
        response::Parts,
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use http_body_util::BodyExt;
use tracing::{error, info_span, warn, Instrument, Span};

use crate::problem::{
    builder::ProblemDetailsBuilder,
    context::RequestContext,
    envelope::{PartialProblem, DETAILS_NOT_SPECIFIED},
    error::ProblemError,
    ProblemDetails,
};
use crate::utils::{
    fault_handler::{panic_message, Fault},
    utils::{log_envelope, APPLICATION_JSON},
};

/// A downstream response whose body has been fully read into memory.
///
/// The capture is the only place the final response is assembled from, so
/// framing headers always match the bytes actually sent.
#[derive(Debug)]
pub struct ResponseCapture {
    parts: Parts,
    buffer: Bytes,
}

impl ResponseCapture {
    /// Reads the whole body of `response`.
    pub async fn collect(response: Response) -> Result<Self, ProblemError> {
        let (parts, body) = response.into_parts();
        let buffer: Bytes = body.collect().await?.to_bytes();

        Ok(Self { parts, buffer })
    }

    /// An empty capture standing in for a response that never materialized.
    pub fn empty(status: StatusCode) -> Self {
        let (mut parts, _) = Response::new(()).into_parts();
        parts.status = status;

        Self {
            parts,
            buffer: Bytes::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    pub fn body(&self) -> &[u8] {
        &self.buffer
    }

    fn is_text(&self) -> bool {
        self.parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("text/"))
    }

    fn take_fault(&mut self) -> Option<Fault> {
        self.parts.extensions.remove::<Fault>()
    }

    /// Discards the captured bytes in favour of a JSON body.
    ///
    /// Headers describing the old representation go with it.
    pub fn replace(&mut self, status: StatusCode, json: Vec<u8>) {
        self.parts.status = status;
        self.parts.headers.remove(CONTENT_ENCODING);
        self.parts.headers.remove(ETAG);
        self.parts
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self.buffer = Bytes::from(json);
    }

    /// Reassembles the response, recomputing `Content-Length` from the final bytes.
    pub fn into_response(self) -> Response {
        let Self { mut parts, buffer } = self;
        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(buffer.len()));

        Response::from_parts(parts, Body::from(buffer))
    }
}

/// Statuses the interceptor rewrites itself.
///
/// 500 is left to the fault handler, which has already rendered the envelope
/// by the time the response reaches this layer.
pub fn is_declared_failure(status: StatusCode) -> bool {
    status.as_u16() >= 400 && status != StatusCode::INTERNAL_SERVER_ERROR
}

fn decode_partial(capture: &ResponseCapture) -> Result<PartialProblem, ProblemError> {
    let body: &[u8] = capture.body();

    if body.is_empty() {
        return Ok(PartialProblem::new().with_detail(DETAILS_NOT_SPECIFIED));
    }

    // framework rejections answer in plain text
    if capture.is_text() {
        let text: String = String::from_utf8_lossy(body).trim().to_owned();
        return Ok(PartialProblem::new().with_detail(text));
    }

    serde_json::from_slice(body).map_err(ProblemError::MalformedBody)
}

fn render_declared_failure(
    builder: &ProblemDetailsBuilder,
    ctx: &RequestContext,
    capture: &ResponseCapture,
) -> Result<Vec<u8>, ProblemError> {
    let mut problem: PartialProblem = decode_partial(capture)?;
    problem.status.get_or_insert(capture.status().as_u16());

    let envelope = builder.build(ctx, problem);
    log_envelope(&envelope);

    serde_json::to_vec(&envelope).map_err(ProblemError::Serialize)
}

/// Replaces whatever was captured with a 500 envelope describing `message`.
fn rewrite_fault(builder: &ProblemDetailsBuilder, ctx: &RequestContext, mut capture: ResponseCapture, message: &str) -> ResponseCapture {
    let status: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;
    let problem: PartialProblem = PartialProblem::new().with_status(status).with_detail(message);
    let envelope = builder.build(&ctx.with_fault(message), problem);
    log_envelope(&envelope);

    match serde_json::to_vec(&envelope) {
        Ok(json) => capture.replace(status, json),
        Err(err) => {
            error!("Failed to serialize problem details: {err}");
            capture.replace(status, Vec::new());
        }
    }
    capture
}

fn rewrite(builder: &ProblemDetailsBuilder, ctx: &RequestContext, mut capture: ResponseCapture) -> ResponseCapture {
    // a fault nobody rendered below us
    if let Some(fault) = capture.take_fault() {
        error!("Unhandled fault: {fault}");
        return rewrite_fault(builder, ctx, capture, fault.message());
    }

    let status: StatusCode = capture.status();
    if !is_declared_failure(status) {
        return capture;
    }

    match render_declared_failure(builder, ctx, &capture) {
        Ok(json) => {
            capture.replace(status, json);
            capture
        }
        Err(err) => {
            warn!(%status, "Could not rewrite failure response: {err}");
            rewrite_fault(builder, ctx, capture, &err.to_string())
        }
    }
}

/// Middleware that standardizes every error response leaving the service.
///
/// Successful responses (and 500s) pass through unchanged apart from a
/// recomputed `Content-Length`. Other 4xx/5xx responses get their body replaced
/// with an enriched problem envelope; panics or body failures below this layer
/// become a 500 envelope.
pub async fn problem_details_middleware(
    State(problems): State<ProblemDetails>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx: RequestContext = problems.request_context(&req);
    req.extensions_mut().insert(ctx.clone());

    let span: Span = info_span!(
        "problem_details",
        method = %req.method(),
        path = %ctx.path(),
        request_id = %ctx.request_id(),
        trace_id = %ctx.trace().trace_id,
    );

    let downstream = async move {
        let response: Response = next.run(req).await;
        ResponseCapture::collect(response).await
    };

    let outcome = AssertUnwindSafe(downstream)
        .catch_unwind()
        .instrument(span.clone())
        .await;

    let builder: &ProblemDetailsBuilder = problems.builder();

    let capture: ResponseCapture = span.in_scope(|| match outcome {
        Ok(Ok(capture)) => rewrite(builder, &ctx, capture),
        Ok(Err(err)) => {
            error!("Downstream response failed: {err}");
            let capture = ResponseCapture::empty(StatusCode::INTERNAL_SERVER_ERROR);
            rewrite_fault(builder, &ctx, capture, &err.to_string())
        }
        Err(payload) => {
            let message: String = panic_message(payload.as_ref());
            error!("Downstream handler panicked: {message}");
            let capture = ResponseCapture::empty(StatusCode::INTERNAL_SERVER_ERROR);
            rewrite_fault(builder, &ctx, capture, &message)
        }
    });

    capture.into_response()
}
