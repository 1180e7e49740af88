//! Postgres implementation of the ledger and alert stores

use async_trait::async_trait;
use shared::{Movement, NewMovement, NewStockAlert, Product, StockAlert};
use sqlx::{PgPool, Postgres, Transaction};

use super::{AlertStore, LockedProduct, MovementStore, MovementTx};
use crate::error::{AppError, AppResult};

const MOVEMENT_COLUMNS: &str = "id, occurred_at, movement_type, product_id, quantity, reference, \
     responsible_name, supplier_id, client_id, user_id";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// A movement transaction bound to one pooled connection.
///
/// The connection returns to the pool when the transaction is committed,
/// rolled back or dropped.
pub struct PgMovementTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MovementTx for PgMovementTx {
    async fn lock_product(&mut self, product_id: i32) -> AppResult<Option<LockedProduct>> {
        let row = sqlx::query_as::<_, (i32, String, i32, i32)>(
            r#"
            SELECT id, name, current_stock, min_stock
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;

        Ok(row.map(|(id, name, current_stock, min_stock)| LockedProduct {
            id,
            name,
            current_stock,
            min_stock,
        }))
    }

    async fn insert_movement(&mut self, movement: &NewMovement) -> AppResult<Movement> {
        let (supplier_id, client_id) = movement.counterparties();

        let query = format!(
            r#"
            INSERT INTO movements (
                movement_type, product_id, quantity, reference, responsible_name,
                supplier_id, client_id, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        );

        sqlx::query_as::<_, Movement>(&query)
            .bind(movement.movement_type)
            .bind(movement.product_id)
            .bind(movement.quantity)
            .bind(&movement.reference)
            .bind(&movement.responsible_name)
            .bind(supplier_id)
            .bind(client_id)
            .bind(movement.user_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(AppError::from_db)
    }

    async fn update_stock(&mut self, product_id: i32, new_stock: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET current_stock = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(new_stock)
        .execute(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(AppError::from_db)
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(AppError::from_db)
    }
}

#[async_trait]
impl MovementStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn MovementTx>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgMovementTx { tx }))
    }

    async fn product_exists(&self, product_id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn movements_for_product(&self, product_id: i32) -> AppResult<Vec<Movement>> {
        let query = format!(
            r#"
            SELECT {}
            FROM movements
            WHERE product_id = $1
            ORDER BY occurred_at DESC, id DESC
            "#,
            MOVEMENT_COLUMNS
        );

        let movements = sqlx::query_as::<_, Movement>(&query)
            .bind(product_id)
            .fetch_all(&self.db)
            .await?;

        Ok(movements)
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn active_admin_email(&self) -> AppResult<Option<String>> {
        let email = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email
            FROM users
            WHERE role = 'admin' AND is_logged_in = TRUE
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(email)
    }

    async fn record_alert(&self, alert: &NewStockAlert) -> AppResult<StockAlert> {
        let recorded = sqlx::query_as::<_, StockAlert>(
            r#"
            WITH inserted AS (
                INSERT INTO stock_alerts (
                    product_id, stock_level, min_stock, responsible_name, recipient, notified
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT i.id, i.product_id, p.code AS product_code, p.name AS product_name,
                   i.stock_level, i.min_stock, i.responsible_name, i.recipient,
                   i.notified, i.created_at
            FROM inserted i
            JOIN products p ON p.id = i.product_id
            "#,
        )
        .bind(alert.product_id)
        .bind(alert.stock_level)
        .bind(alert.min_stock)
        .bind(&alert.responsible_name)
        .bind(&alert.recipient)
        .bind(alert.notified)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::from_db)?;

        Ok(recorded)
    }

    async fn list_alerts(&self) -> AppResult<Vec<StockAlert>> {
        let alerts = sqlx::query_as::<_, StockAlert>(
            r#"
            SELECT a.id, a.product_id, p.code AS product_code, p.name AS product_name,
                   a.stock_level, a.min_stock, a.responsible_name, a.recipient,
                   a.notified, a.created_at
            FROM stock_alerts a
            JOIN products p ON p.id = a.product_id
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    async fn low_stock_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, category, unit, min_stock, current_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE current_stock < min_stock
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }
}
