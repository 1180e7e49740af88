//! Stock movement ledger models and stock arithmetic

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MovementType;

/// A persisted stock movement. Movements are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: i32,
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub product_id: i32,
    pub quantity: i32,
    pub reference: Option<String>,
    pub responsible_name: String,
    pub supplier_id: Option<i32>,
    pub client_id: Option<i32>,
    pub user_id: i32,
}

/// A validated movement request, ready to be applied to the ledger.
///
/// Exactly one counterparty is set: the supplier for `Entrada`,
/// the client for `Salida`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub product_id: i32,
    pub quantity: i32,
    pub reference: Option<String>,
    pub responsible_name: String,
    pub supplier_id: Option<i32>,
    pub client_id: Option<i32>,
    pub user_id: i32,
}

impl NewMovement {
    /// `(supplier_id, client_id)` with the counterparty that does not apply
    /// to this movement type forced to `None`
    pub fn counterparties(&self) -> (Option<i32>, Option<i32>) {
        match self.movement_type {
            MovementType::Entrada => (self.supplier_id, None),
            MovementType::Salida => (None, self.client_id),
        }
    }
}

/// Rule violations when applying a movement to a stock level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockViolation {
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: i32, available: i32 },

    #[error("stock level would exceed the supported maximum")]
    Overflow,
}

/// Compute the stock level after applying a movement.
///
/// `Entrada` adds, `Salida` subtracts and never drives stock below zero.
pub fn next_stock(
    current: i32,
    movement_type: MovementType,
    quantity: i32,
) -> Result<i32, StockViolation> {
    match movement_type {
        MovementType::Entrada => current
            .checked_add(quantity)
            .ok_or(StockViolation::Overflow),
        MovementType::Salida => {
            if current < quantity {
                return Err(StockViolation::Insufficient {
                    requested: quantity,
                    available: current,
                });
            }
            Ok(current - quantity)
        }
    }
}

/// Whether a movement leaves the product below its minimum stock.
///
/// Only outbound movements raise the alert, and only when the new level is
/// strictly below the minimum.
pub fn triggers_low_stock_alert(movement_type: MovementType, new_stock: i32, min_stock: i32) -> bool {
    movement_type == MovementType::Salida && new_stock < min_stock
}
