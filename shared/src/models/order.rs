//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle state
///
/// `Pending -> {Confirmed, Rejected}`; both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Pending,
    Confirmed,
    Rejected,
}

impl OrderState {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "PENDING",
            OrderState::Confirmed => "CONFIRMED",
            OrderState::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderState::Pending)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderState::Pending),
            "CONFIRMED" => Ok(OrderState::Confirmed),
            "REJECTED" => Ok(OrderState::Rejected),
            other => Err(format!("unknown order state: {other}")),
        }
    }
}

/// One product line with the price captured when the order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_snapshot: f64,
}

/// Order entity (点单)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub customer_user_id: Option<i64>,
    pub visit_code: Option<String>,
    pub state: OrderState,
    pub invoice_id: Option<i64>,
    pub created_at: i64,
    pub lines: Vec<OrderLine>,
    /// Σ quantity × unit_price_snapshot
    pub total: f64,
}

/// Requested line (price is resolved server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// Staff order creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffOrderCreate {
    pub table_id: i64,
    pub lines: Vec<OrderLineInput>,
    #[serde(default)]
    pub customer_user_id: Option<i64>,
}

/// Anonymous (device session) order creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousOrderCreate {
    pub table_number: i64,
    pub lines: Vec<OrderLineInput>,
    pub session_id: String,
    pub visit_token: String,
}

/// Replace the lines of a pending order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLinesUpdate {
    pub lines: Vec<OrderLineInput>,
}

/// Staff decision on a pending order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderState,
}

/// Customer visit view query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitOrdersQuery {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: i64,
}

/// Pending order count of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PendingCount {
    pub table_id: i64,
    pub table_number: i64,
    pub pending: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_storage_round_trip() {
        for state in [OrderState::Pending, OrderState::Confirmed, OrderState::Rejected] {
            assert_eq!(state.as_str().parse::<OrderState>().unwrap(), state);
        }
        assert!("PAID".parse::<OrderState>().is_err());
    }

    #[test]
    fn test_state_wire_format() {
        let update: OrderStatusUpdate = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert_eq!(update.status, OrderState::Confirmed);
        assert!(OrderState::Rejected.is_terminal());
        assert!(!OrderState::Pending.is_terminal());
    }
}
