// Demo endpoints

pub mod handler;
pub mod routes;
