// Last-resort handler turning faults that escaped the handlers into problem envelopes

use std::{
    any::Any,
    backtrace::{Backtrace, BacktraceStatus},
    error::Error as StdError,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::problem::{
    builder::{reason_phrase, ProblemDetailsBuilder},
    context::RequestContext,
    error::ProblemError,
    ProblemDetails,
};
use crate::utils::utils::APPLICATION_JSON;

/// Extension key holding the stack trace outside production.
pub const STACK_TRACE_KEY: &str = "StackTrace";

/// An error that escaped a handler: its message, where it happened, and any
/// structured data attached to it.
///
/// Returning a `Fault` from a handler yields a 500 response carrying the fault
/// in its extensions, where [`unhandled_fault_middleware`] picks it up.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
    trace: StackTrace,
    data: IndexMap<String, Value>,
}

/// Where a fault happened, symbolized only when rendered.
#[derive(Debug, Clone)]
enum StackTrace {
    Captured(Arc<Backtrace>),
    Anyhow(Arc<anyhow::Error>),
}

impl StackTrace {
    fn capture() -> Self {
        Self::Captured(Arc::new(Backtrace::force_capture()))
    }

    fn render(&self) -> String {
        match self {
            Self::Captured(backtrace) => backtrace.to_string(),
            Self::Anyhow(err) => err.backtrace().to_string(),
        }
    }
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: StackTrace::capture(),
            data: IndexMap::new(),
        }
    }

    /// Attaches a structured pair reported alongside the fault.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        Self::new(err.to_string())
    }

    /// Recovers the message of a caught panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new(panic_message(payload))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Formats the stack trace; this symbolizes frames and is not cheap.
    pub fn stack_trace(&self) -> String {
        self.trace.render()
    }

    pub fn data(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        let message: String = err.to_string();
        let trace: StackTrace = match err.backtrace().status() {
            BacktraceStatus::Captured => StackTrace::Anyhow(Arc::new(err)),
            _ => StackTrace::capture(),
        };

        Self {
            message,
            trace,
            data: IndexMap::new(),
        }
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut response: Response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}

/// Renders faults as 500 problem envelopes.
#[derive(Debug, Clone)]
pub struct UnhandledFaultHandler {
    builder: ProblemDetailsBuilder,
    production: bool,
    correlation_header: HeaderName,
}

impl UnhandledFaultHandler {
    pub fn new(builder: ProblemDetailsBuilder, production: bool, correlation_header: HeaderName) -> Self {
        Self {
            builder,
            production,
            correlation_header,
        }
    }

    /// Answers with a 500 JSON response describing `fault`.
    ///
    /// Without a fault there is nothing to report and the body stays empty.
    /// Never panics: if rendering fails the body is left empty as well.
    pub fn handle(&self, ctx: &RequestContext, correlation_id: Option<&str>, fault: Option<&Fault>) -> Response {
        let mut response: Response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

        let Some(fault) = fault else {
            return response;
        };

        error!(path = %ctx.path(), request_id = %ctx.request_id(), "Unhandled fault: {fault}");

        match self.render(ctx, correlation_id, fault) {
            Ok(body) => {
                response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
                *response.body_mut() = Body::from(body);
            }
            Err(err) => error!("Failed to render problem details for fault: {err}"),
        }

        response
    }

    fn render(&self, ctx: &RequestContext, correlation_id: Option<&str>, fault: &Fault) -> Result<Vec<u8>, ProblemError> {
        let status: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;
        let ctx: RequestContext = ctx.with_fault(fault.message());
        let mut envelope = self.builder.build_explicit(
            &ctx,
            status,
            Some(reason_phrase(status.as_u16())),
            Some(fault.message()),
            None,
            None,
        )?;

        if let Some(id) = correlation_id.filter(|id| !id.is_empty()) {
            envelope
                .extensions
                .insert_if_absent(self.correlation_header.as_str(), id);
        }
        if !self.production {
            envelope
                .extensions
                .insert_if_absent(STACK_TRACE_KEY, fault.stack_trace());
        }
        envelope
            .extensions
            .extend_if_absent(fault.data().map(|(key, value)| (key.clone(), value.clone())));

        serde_json::to_vec(&envelope).map_err(ProblemError::Serialize)
    }
}

/// Middleware rendering faults raised below it: panics, and `Fault` values
/// left in response extensions by handlers or by `handle_global_error`.
pub async fn unhandled_fault_middleware(
    State(problems): State<ProblemDetails>,
    req: Request,
    next: Next,
) -> Response {
    let ctx: RequestContext = problems.request_context(&req);
    let correlation_id: Option<String> = req
        .headers()
        .get(problems.correlation_header())
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(mut response) => match response.extensions_mut().remove::<Fault>() {
            Some(fault) => problems
                .faults()
                .handle(&ctx, correlation_id.as_deref(), Some(&fault)),
            None => response,
        },
        Err(payload) => {
            let fault: Fault = Fault::from_panic(payload.as_ref());
            problems
                .faults()
                .handle(&ctx, correlation_id.as_deref(), Some(&fault))
        }
    }
}
