//! Shared types for the table visit service
//!
//! Common types used by the server and its HTTP clients: error codes,
//! the unified response envelope, wire models and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, ErrorKind};
pub use http;
pub use serde::{Deserialize, Serialize};
