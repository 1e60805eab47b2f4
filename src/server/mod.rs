//! HTTP server and shared application state

pub mod cors;
pub mod http;

pub use cors::Cors;
pub use http::{run, AppState};
