// Router extension wiring the problem details middlewares in the right order

use axum::{middleware::from_fn_with_state, Router};

use crate::problem::ProblemDetails;
use crate::utils::{
    fault_handler::unhandled_fault_middleware,
    response_handler::problem_details_middleware,
};

/// Adds the problem details layers to a router.
///
/// Call it after every route and fallback has been registered; only those are
/// covered.
pub trait ProblemDetailsExt {
    /// Installs the fault handler and, around it, the response interceptor.
    fn problem_details(self, problems: ProblemDetails) -> Self;

    /// Installs only the fault handler.
    fn problem_details_fault_handler(self, problems: ProblemDetails) -> Self;
}

impl<S> ProblemDetailsExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn problem_details(self, problems: ProblemDetails) -> Self {
        // the layer added last runs first
        self.problem_details_fault_handler(problems.clone())
            .layer(from_fn_with_state(problems, problem_details_middleware))
    }

    fn problem_details_fault_handler(self, problems: ProblemDetails) -> Self {
        self.layer(from_fn_with_state(problems, unhandled_fault_middleware))
    }
}
