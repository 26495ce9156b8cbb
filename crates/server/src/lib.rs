//! Server crate for Filmorate.
//!
//! This crate contains the application facade that sits between a
//! request-handling layer and the catalog core, plus its configuration and
//! the error-to-status mapping.

pub mod app;
pub mod config;
pub mod response;

pub use app::{Clock, Filmorate, SeedSummary};
pub use config::AppConfig;
pub use response::{status_code, ErrorBody, ErrorResponse};
