// Explicit per-request context handed to the builder: path, ids, trace data, active fault

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderName, Uri},
};
use uuid::Uuid;

use crate::problem::ProblemDetails;

/// Default header carrying the caller supplied correlation id.
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

const TRACEPARENT_HEADER: &str = "traceparent";
const BAGGAGE_HEADER: &str = "baggage";

/// Trace data for the current hop, read from W3C `traceparent` and `baggage` headers.
///
/// When the caller sent no valid `traceparent` a new trace is started. The span
/// id always identifies this hop and is freshly generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: Option<String>,
    pub baggage: Vec<(String, String)>,
}

impl TraceContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let parent: Option<(String, String)> = headers
            .get(TRACEPARENT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_traceparent);

        let (trace_id, parent_id) = match parent {
            Some((trace_id, parent_id)) => (trace_id, Some(parent_id)),
            None => (Uuid::new_v4().simple().to_string(), None),
        };

        let baggage: Vec<(String, String)> = headers
            .get_all(BAGGAGE_HEADER)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_baggage)
            .collect();

        Self {
            trace_id,
            span_id: new_span_id(),
            parent_id,
            baggage,
        }
    }
}

fn new_span_id() -> String {
    let mut id: String = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

fn is_lower_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Parses `version-traceid-parentid-flags`, returning the trace and parent ids.
fn parse_traceparent(value: &str) -> Option<(String, String)> {
    let mut fields = value.trim().split('-');
    let version: &str = fields.next()?;
    let trace_id: &str = fields.next()?;
    let parent_id: &str = fields.next()?;
    let flags: &str = fields.next()?;

    if !is_lower_hex(version, 2) || version == "ff" || !is_lower_hex(flags, 2) {
        return None;
    }
    // version 00 has exactly four fields
    if version == "00" && fields.next().is_some() {
        return None;
    }
    if !is_lower_hex(trace_id, 32) || trace_id.bytes().all(|b| b == b'0') {
        return None;
    }
    if !is_lower_hex(parent_id, 16) || parent_id.bytes().all(|b| b == b'0') {
        return None;
    }

    Some((trace_id.to_owned(), parent_id.to_owned()))
}

/// Parses a `baggage` header into key/value pairs, dropping member properties.
fn parse_baggage(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .filter_map(|member| {
            let pair: &str = member.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            let key: &str = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Everything the builder needs to know about the request being answered.
#[derive(Debug, Clone)]
pub struct RequestContext {
    path: String,
    request_id: String,
    trace: TraceContext,
    fault: Option<String>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, request_id: impl Into<String>, trace: TraceContext) -> Self {
        Self {
            path: path.into(),
            request_id: request_id.into(),
            trace,
            fault: None,
        }
    }

    /// Builds the context from request metadata.
    ///
    /// The request id is taken from `correlation_header` when the caller sent
    /// one, otherwise a UUID v4 is generated.
    pub fn from_parts(uri: &Uri, headers: &HeaderMap, correlation_header: &HeaderName) -> Self {
        let request_id: String = headers
            .get(correlation_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

        Self::new(uri.path(), request_id, TraceContext::from_headers(headers))
    }

    /// Returns a copy carrying `message` as the active fault.
    pub fn with_fault(&self, message: impl Into<String>) -> Self {
        Self {
            fault: Some(message.into()),
            ..self.clone()
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }
}

// Handlers behind the interceptor receive the same context it built; without
// the interceptor a fresh one is derived using the configured correlation header.
impl<S> FromRequestParts<S> for RequestContext
where
    ProblemDetails: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        let problems: ProblemDetails = ProblemDetails::from_ref(state);
        Ok(Self::from_parts(&parts.uri, &parts.headers, problems.correlation_header()))
    }
}
