//! Invoice (ticket) Model

use serde::{Deserialize, Serialize};

/// Billing artifact for one or more confirmed orders of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub table_id: i64,
    pub total: f64,
    pub created_at: i64,
    /// Orders billed by this invoice
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub order_ids: Vec<i64>,
}

/// Ticket request for a single order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreate {
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceIssued {
    pub message: String,
    pub ticket: Invoice,
}

/// Printer callback: the ticket of a table was printed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePrinted {
    pub table_id: i64,
}
