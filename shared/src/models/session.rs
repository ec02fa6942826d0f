//! Device Session Model

use serde::{Deserialize, Serialize};

/// A customer device bound to one visit of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DeviceSession {
    pub id: String,
    pub table_id: i64,
    /// Visit token live at issuance time
    #[serde(skip_serializing, default)]
    pub visit_token: String,
    pub is_active: bool,
    pub created_at: i64,
    pub last_activity_at: i64,
}

/// QR scan request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTableRequest {
    pub table_number: i64,
}

/// QR scan result: the secret pair a device keeps for the rest of the visit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTableResponse {
    pub visit_token: String,
    pub session_id: String,
}

/// Session check request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSessionRequest {
    pub session_id: String,
    pub visit_token: String,
}

/// Session check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<i64>,
}

impl SessionValidation {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            visit_token: None,
            table_number: None,
        }
    }

    pub fn valid(visit_token: String, table_number: i64) -> Self {
        Self {
            valid: true,
            visit_token: Some(visit_token),
            table_number: Some(table_number),
        }
    }
}
