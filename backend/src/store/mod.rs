//! Persistence seam for the movement ledger and the low-stock alert log
//!
//! The movement engine only talks to these traits. [`PgStore`] is the
//! production implementation; [`InMemoryStore`] keeps the same locking and
//! commit semantics in process memory.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::{Movement, NewMovement, NewStockAlert, Product, StockAlert};

use crate::error::AppResult;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Product row as read under its row lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProduct {
    pub id: i32,
    pub name: String,
    pub current_stock: i32,
    pub min_stock: i32,
}

/// One open movement transaction.
///
/// Row locks taken by [`MovementTx::lock_product`] are held until the
/// transaction is committed, rolled back or dropped. Dropping without
/// committing discards every write.
#[async_trait]
pub trait MovementTx: Send {
    /// Lock the product row for the rest of the transaction
    async fn lock_product(&mut self, product_id: i32) -> AppResult<Option<LockedProduct>>;

    async fn insert_movement(&mut self, movement: &NewMovement) -> AppResult<Movement>;

    async fn update_stock(&mut self, product_id: i32, new_stock: i32) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

#[async_trait]
pub trait MovementStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn MovementTx>>;

    async fn product_exists(&self, product_id: i32) -> AppResult<bool>;

    /// Movements of a product, newest first
    async fn movements_for_product(&self, product_id: i32) -> AppResult<Vec<Movement>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Email of a signed-in administrator, if any
    async fn active_admin_email(&self) -> AppResult<Option<String>>;

    async fn record_alert(&self, alert: &NewStockAlert) -> AppResult<StockAlert>;

    /// Alert log, newest first
    async fn list_alerts(&self) -> AppResult<Vec<StockAlert>>;

    /// Products currently below their minimum stock
    async fn low_stock_products(&self) -> AppResult<Vec<Product>>;
}
