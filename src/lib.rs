// Library root for the problem details API

pub mod api;
pub mod config;
pub mod core;
pub mod problem;
pub mod utils;

pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::state::AppState;
pub use crate::core::server::create_app;
pub use crate::problem::{
    PartialProblem, ProblemDetails, ProblemDetailsBuilder, ProblemDetailsOptions, ProblemEnvelope,
    RequestContext, StatusCodeMapping, ValidationErrors,
};
pub use crate::utils::{
    fault_handler::{Fault, UnhandledFaultHandler},
    layers::ProblemDetailsExt,
};
