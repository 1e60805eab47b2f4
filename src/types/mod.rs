//! Shared types

mod error;

pub use error::{ApiError, Result};
