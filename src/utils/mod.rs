// Middleware layers and helpers: the response interceptor, the fault handler,
// the tower error handler and the router extension tying them together

pub mod error_handler;
pub mod fault_handler;
pub mod layers;
pub mod response_handler;
pub mod utils;
