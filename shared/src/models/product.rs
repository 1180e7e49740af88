//! Product catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stocked product.
///
/// `current_stock` only changes through movement processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub min_stock: i32,
    pub current_stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock < self.min_stock
    }

    /// Units missing to reach the minimum stock, zero when none are missing
    pub fn deficit(&self) -> i32 {
        (self.min_stock - self.current_stock).max(0)
    }
}

/// Validated input for creating a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub min_stock: i32,
    pub initial_stock: i32,
}

/// Validated partial update of a product's catalog data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<i32>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.unit.is_none()
            && self.min_stock.is_none()
    }
}
