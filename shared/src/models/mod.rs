//! Data models
//!
//! Shared between the server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), except device session ids
//! which are opaque random strings handed to customers.

pub mod dining_table;
pub mod invoice;
pub mod order;
pub mod product;
pub mod session;

// Re-exports
pub use dining_table::*;
pub use invoice::*;
pub use order::*;
pub use product::*;
pub use session::*;
