//! Low-stock alert log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded low-stock event, joined with the product it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub id: i32,
    pub product_id: i32,
    pub product_code: String,
    pub product_name: String,
    pub stock_level: i32,
    pub min_stock: i32,
    pub responsible_name: String,
    pub recipient: String,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

/// A low-stock event raised by an outbound movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockEvent {
    pub product_id: i32,
    pub product_name: String,
    pub stock_level: i32,
    pub min_stock: i32,
    pub responsible_name: String,
}

/// Outcome of an alert delivery attempt, appended to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockAlert {
    pub product_id: i32,
    pub stock_level: i32,
    pub min_stock: i32,
    pub responsible_name: String,
    pub recipient: String,
    pub notified: bool,
}
