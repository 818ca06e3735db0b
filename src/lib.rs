//! Procedure Hub - procedure tracking service
//!
//! Turns chat messages into persistent, actionable procedures: admin users
//! record procedures, staff acknowledge having read them, and every
//! procedure carries aggregate read-acknowledgment statistics.
//!
//! ## Services
//!
//! - **Auth**: email/password registration and sign-in with Argon2 password
//!   hashing and stateless JWT sessions
//! - **Procedures**: admin-managed procedure records with a free-form
//!   lifecycle status (active/archived/replaced)
//! - **Acknowledgments**: one-per-user read receipts, enforced by a unique
//!   compound index at the store layer
//! - **Dashboard**: the filter/search/sort and statistics rules behind the
//!   procedure list and per-procedure cards

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HubError, Result};
