//! Dining Table Model

use serde::{Deserialize, Serialize};

use super::invoice::Invoice;

/// Dining table entity (桌台)
///
/// `visit_token` is only present while `is_open` is true. It is never
/// serialized: customers receive it once from the scan endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DiningTable {
    pub id: i64,
    pub number: i64,
    pub is_open: bool,
    #[serde(skip_serializing, default)]
    pub visit_token: Option<String>,
    pub verification_code: Option<String>,
    pub updated_at: i64,
}

/// Customer-facing view of a table (no secrets)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePublicView {
    pub id: i64,
    pub number: i64,
    pub is_open: bool,
}

impl From<&DiningTable> for TablePublicView {
    fn from(table: &DiningTable) -> Self {
        Self {
            id: table.id,
            number: table.number,
            is_open: table.is_open,
        }
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: i64,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: i64,
}

/// Staff open/close request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatusUpdate {
    pub is_open: bool,
}

/// Result of a staff open/close
///
/// Closing bills every confirmed order that had no ticket yet; those
/// tickets are returned here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatusChanged {
    pub table: DiningTable,
    #[serde(default)]
    pub tickets: Vec<Invoice>,
}

/// Customer code check request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub table_number: i64,
    pub code: String,
}

/// Customer code check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub valid: bool,
    pub message: String,
}
