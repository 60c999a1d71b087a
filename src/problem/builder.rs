// Pure construction of problem envelopes: defaulting plus tracing enrichment

use std::sync::Arc;

use axum::http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::problem::{
    context::RequestContext,
    envelope::{Extensions, PartialProblem, ProblemEnvelope, ABOUT_BLANK},
    error::ProblemError,
    mapping::StatusCodeMapping,
};

pub const SPAN_ID_KEY: &str = "spanId";
pub const PARENT_ID_KEY: &str = "parentId";
pub const TRACE_ID_KEY: &str = "traceId";
pub const REQUEST_ID_KEY: &str = "requestId";
pub const ERRORS_KEY: &str = "errors";

/// Title used by validation problems when the caller gives none.
pub const VALIDATION_TITLE: &str = "One or more validation errors occurred.";

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, messages)| (field.clone(), Value::from(messages.clone())))
                .collect(),
        )
    }
}

/// Standard reason phrase for a status code, empty for unknown codes.
pub fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}

/// Turns partial problem documents into complete envelopes.
///
/// Every default is applied with "set only if absent" semantics, so anything
/// the caller already decided survives. Cloning is cheap: the status mapping
/// is shared.
#[derive(Debug, Clone, Default)]
pub struct ProblemDetailsBuilder {
    mapping: Arc<StatusCodeMapping>,
}

impl ProblemDetailsBuilder {
    pub fn new(mapping: StatusCodeMapping) -> Self {
        Self {
            mapping: Arc::new(mapping),
        }
    }

    pub fn mapping(&self) -> &StatusCodeMapping {
        &self.mapping
    }

    /// Completes `problem` with defaults and tracing metadata from `ctx`.
    ///
    /// Passing an already built envelope back in is a no-op for every member
    /// and extension it carries.
    pub fn build(&self, ctx: &RequestContext, problem: impl Into<PartialProblem>) -> ProblemEnvelope {
        let problem: PartialProblem = problem.into();

        let status: u16 = problem.status.unwrap_or(500);
        let mut title: Option<String> = problem.title.or_else(|| {
            Some(reason_phrase(status))
                .filter(|reason| !reason.is_empty())
                .map(str::to_owned)
        });
        let detail: Option<String> = problem
            .detail
            .or_else(|| ctx.fault().map(str::to_owned));
        let mut type_url: Option<String> = problem.type_url;

        if let Some(data) = self.mapping.get(status) {
            title.get_or_insert_with(|| data.title.clone());
            type_url.get_or_insert_with(|| data.link.clone());
        }

        let mut envelope = ProblemEnvelope {
            status,
            title: title.unwrap_or_default(),
            detail,
            type_url: type_url.unwrap_or_else(|| ABOUT_BLANK.to_owned()),
            instance: problem.instance.unwrap_or_else(|| ctx.path().to_owned()),
            extensions: problem.extensions,
        };

        add_tracing_info(&mut envelope.extensions, ctx);
        envelope
    }

    /// Builds an envelope from explicit members.
    ///
    /// `title` and `detail` must be present; an empty string is still a value
    /// and is written as is.
    pub fn build_explicit(
        &self,
        ctx: &RequestContext,
        status: StatusCode,
        title: Option<&str>,
        detail: Option<&str>,
        type_url: Option<&str>,
        instance: Option<&str>,
    ) -> Result<ProblemEnvelope, ProblemError> {
        let title: &str = title.ok_or(ProblemError::InvalidArgument("title"))?;
        let detail: &str = detail.ok_or(ProblemError::InvalidArgument("detail"))?;

        let problem = PartialProblem {
            status: Some(status.as_u16()),
            title: Some(title.to_owned()),
            detail: Some(detail.to_owned()),
            type_url: type_url.map(str::to_owned),
            instance: instance.map(str::to_owned),
            extensions: Extensions::new(),
        };

        Ok(self.build(ctx, problem))
    }

    /// Builds a validation problem; status defaults to 400 instead of 500.
    ///
    /// The failures are exposed under the `errors` extension as an object of
    /// field name to messages.
    pub fn build_validation(
        &self,
        ctx: &RequestContext,
        errors: &ValidationErrors,
        problem: PartialProblem,
    ) -> ProblemEnvelope {
        let mut problem: PartialProblem = problem;
        problem.status.get_or_insert(StatusCode::BAD_REQUEST.as_u16());
        problem
            .title
            .get_or_insert_with(|| VALIDATION_TITLE.to_owned());

        let mut extensions = Extensions::new();
        extensions.insert_if_absent(ERRORS_KEY, errors.to_value());
        extensions.extend_if_absent(problem.extensions);
        problem.extensions = extensions;

        self.build(ctx, problem)
    }
}

fn add_tracing_info(extensions: &mut Extensions, ctx: &RequestContext) {
    let trace = ctx.trace();

    let ids: [(&str, Option<&str>); 4] = [
        (SPAN_ID_KEY, Some(trace.span_id.as_str())),
        (PARENT_ID_KEY, trace.parent_id.as_deref()),
        (TRACE_ID_KEY, Some(trace.trace_id.as_str())),
        (REQUEST_ID_KEY, Some(ctx.request_id())),
    ];
    for (key, value) in ids {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            extensions.insert_if_absent(key, value);
        }
    }

    extensions.extend_if_absent(
        trace
            .baggage
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );
}
