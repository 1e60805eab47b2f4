//! TrustML backend - resource catalog and download analytics
//!
//! Serves the marketing site's downloadable resources and records how
//! visitors interact with them.
//!
//! ## Components
//!
//! - **Resource store**: catalog of downloadable documents with a per-resource
//!   download counter
//! - **Activity log**: append-only downloads, link interactions, analytics
//!   events and status checks
//! - **Reporting**: dashboard, per-category and per-resource aggregates
//!
//! MongoDB is the production store; an in-memory backend serves dev mode and
//! tests.

pub mod config;
pub mod db;
pub mod files;
pub mod logging;
pub mod reporting;
pub mod routes;
pub mod seed;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiError, Result};
