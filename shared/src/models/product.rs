//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity, as far as ordering needs it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
}
