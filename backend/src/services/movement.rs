//! Stock movement registration and history
//!
//! Registering a movement is one transaction: lock the product row, compute
//! the new level, append the movement and write the level back. Low-stock
//! events are handed to the notifier only after the transaction commits.

use serde::Serialize;
use serde_json::Value;
use shared::{
    next_stock, required_positive_id, triggers_low_stock_alert, validate_movement, LowStockEvent,
    Movement, MovementType, NewMovement, RawMovementInput,
};
use std::sync::Arc;

use super::notification::LowStockNotifier;
use crate::error::{AppError, AppResult};
use crate::store::{MovementStore, MovementTx};

/// Movement service over an injected ledger store
#[derive(Clone)]
pub struct MovementService {
    store: Arc<dyn MovementStore>,
    notifier: LowStockNotifier,
}

/// Result of a committed movement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementOutcome {
    pub movement: Movement,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub new_stock: i32,
    pub alert_sent: bool,
}

/// Movements of one product, newest first
#[derive(Debug, Clone, Serialize)]
pub struct MovementHistory {
    pub movements: Vec<Movement>,
    pub total: usize,
}

/// Writes of a movement that has not been committed yet
struct Applied {
    movement: Movement,
    new_stock: i32,
    alert: Option<LowStockEvent>,
}

impl MovementService {
    pub fn new(store: Arc<dyn MovementStore>, notifier: LowStockNotifier) -> Self {
        Self { store, notifier }
    }

    /// Validate and register a movement request
    pub async fn register_movement(&self, raw: &RawMovementInput) -> AppResult<MovementOutcome> {
        let input = validate_movement(raw)?;
        self.register(input).await
    }

    /// Register an already validated movement
    pub async fn register(&self, input: NewMovement) -> AppResult<MovementOutcome> {
        let mut tx = self.store.begin().await?;

        let applied = match Self::apply(tx.as_mut(), &input).await {
            Ok(applied) => applied,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        product_id = input.product_id,
                        "Rollback failed: {}",
                        rollback_err
                    );
                }
                return Err(err);
            }
        };

        tx.commit().await?;

        tracing::info!(
            movement_id = applied.movement.id,
            product_id = input.product_id,
            movement_type = %input.movement_type,
            quantity = input.quantity,
            new_stock = applied.new_stock,
            "Movement registered"
        );

        let alert_sent = applied.alert.is_some();
        if let Some(event) = applied.alert {
            self.notifier.notify(event);
        }

        Ok(MovementOutcome {
            movement: applied.movement,
            movement_type: input.movement_type,
            new_stock: applied.new_stock,
            alert_sent,
        })
    }

    async fn apply(tx: &mut dyn MovementTx, input: &NewMovement) -> AppResult<Applied> {
        let product = tx
            .lock_product(input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let new_stock = next_stock(product.current_stock, input.movement_type, input.quantity)?;

        let movement = tx.insert_movement(input).await?;
        tx.update_stock(product.id, new_stock).await?;

        let alert = triggers_low_stock_alert(input.movement_type, new_stock, product.min_stock)
            .then(|| LowStockEvent {
                product_id: product.id,
                product_name: product.name,
                stock_level: new_stock,
                min_stock: product.min_stock,
                responsible_name: input.responsible_name.clone(),
            });

        Ok(Applied {
            movement,
            new_stock,
            alert,
        })
    }

    /// Movement history of a product. `product_id` is the raw request value.
    pub async fn get_movements_by_product(
        &self,
        product_id: Option<&Value>,
    ) -> AppResult<MovementHistory> {
        let product_id = required_positive_id(product_id, "productId")?;

        if !self.store.product_exists(product_id).await? {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let movements = self.store.movements_for_product(product_id).await?;
        Ok(MovementHistory {
            total: movements.len(),
            movements,
        })
    }
}
