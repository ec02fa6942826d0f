//! Unified error system
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`ErrorKind`]: Caller-facing failure kind (what to do about it)
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorKind, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::TableClosed).with_detail("table_id", 7);
//! assert_eq!(err.kind(), ErrorKind::Conflict);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(7005));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::{ErrorCategory, ErrorKind};
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
