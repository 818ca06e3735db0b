//! HTTP server for Procedure Hub

mod http;

pub use http::{run, AppState};
