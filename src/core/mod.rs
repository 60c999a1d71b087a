// Logging setup and server wiring

pub mod logging;
pub mod server;
