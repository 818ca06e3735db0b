//! HTTP routes for Procedure Hub

pub mod auth_routes;
pub mod health;
pub mod procedures;

pub use auth_routes::handle_auth_request;
pub use health::{health_check, readiness_check, version_info};
pub use procedures::handle_procedure_request;
