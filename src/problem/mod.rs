// Problem details model, builder and the shared middleware state

pub mod builder;
pub mod context;
pub mod envelope;
pub mod error;
pub mod mapping;

use anyhow::{anyhow, Context, Result};
use axum::{body::Body, http::{HeaderName, Request}};

use crate::config::environment::EnvironmentVariables;
use crate::utils::fault_handler::UnhandledFaultHandler;

pub use builder::{ProblemDetailsBuilder, ValidationErrors};
pub use context::{RequestContext, TraceContext, DEFAULT_REQUEST_ID_HEADER};
pub use envelope::{Extensions, PartialProblem, ProblemEnvelope};
pub use error::ProblemError;
pub use mapping::StatusCodeMapping;

/// Knobs for the problem details layers.
#[derive(Debug, Clone)]
pub struct ProblemDetailsOptions {
    /// Hides stack traces from fault envelopes.
    pub production: bool,
    /// Header carrying the caller's correlation id.
    pub correlation_header: HeaderName,
    pub mapping: StatusCodeMapping,
}

impl Default for ProblemDetailsOptions {
    fn default() -> Self {
        Self {
            production: false,
            correlation_header: HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER),
            mapping: StatusCodeMapping::default(),
        }
    }
}

impl ProblemDetailsOptions {
    pub fn from_env(env: &EnvironmentVariables) -> Result<Self> {
        let correlation_header: HeaderName = HeaderName::from_bytes(env.request_id_header.as_bytes())
            .context("Invalid REQUEST_ID_HEADER value")?;
        let mapping: StatusCodeMapping = StatusCodeMapping::from_preset(&env.problem_type_links)
            .ok_or_else(|| anyhow!("Unknown PROBLEM_TYPE_LINKS preset '{}'", env.problem_type_links))?;

        Ok(Self {
            production: env.is_production(),
            correlation_header,
            mapping,
        })
    }
}

/// State shared by the interceptor and the fault handler middlewares.
#[derive(Debug, Clone)]
pub struct ProblemDetails {
    builder: ProblemDetailsBuilder,
    faults: UnhandledFaultHandler,
    correlation_header: HeaderName,
}

impl ProblemDetails {
    pub fn new(options: ProblemDetailsOptions) -> Self {
        let builder: ProblemDetailsBuilder = ProblemDetailsBuilder::new(options.mapping);
        let faults: UnhandledFaultHandler = UnhandledFaultHandler::new(
            builder.clone(),
            options.production,
            options.correlation_header.clone(),
        );

        Self {
            builder,
            faults,
            correlation_header: options.correlation_header,
        }
    }

    pub fn builder(&self) -> &ProblemDetailsBuilder {
        &self.builder
    }

    pub fn faults(&self) -> &UnhandledFaultHandler {
        &self.faults
    }

    pub fn correlation_header(&self) -> &HeaderName {
        &self.correlation_header
    }

    /// Returns the context an outer layer already attached, or derives a new one.
    pub fn request_context(&self, req: &Request<Body>) -> RequestContext {
        req.extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(req.uri(), req.headers(), &self.correlation_header))
    }
}

impl Default for ProblemDetails {
    fn default() -> Self {
        Self::new(ProblemDetailsOptions::default())
    }
}
