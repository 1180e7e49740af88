//! In-process store with the same transactional behaviour as Postgres
//!
//! Each product row has its own async lock. A transaction keeps the locks it
//! took until it commits or is dropped, and buffers its writes so that nothing
//! becomes visible before commit.

use async_trait::async_trait;
use chrono::Utc;
use shared::{Movement, NewMovement, NewStockAlert, Product, Role, StockAlert};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::{AlertStore, LockedProduct, MovementStore, MovementTx};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
struct SeedUser {
    email: String,
    role: Role,
    is_logged_in: bool,
}

#[derive(Default)]
struct State {
    products: BTreeMap<i32, Product>,
    suppliers: BTreeMap<i32, String>,
    clients: BTreeMap<i32, String>,
    users: BTreeMap<i32, SeedUser>,
    movements: Vec<Movement>,
    alerts: Vec<StockAlert>,
    next_id: i32,
}

impl State {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    row_locks: Mutex<HashMap<i32, Arc<RowLock<()>>>>,
    fail_writes: AtomicBool,
}

/// Shared handle to an in-memory inventory database
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn row_lock(&self, product_id: i32) -> Arc<RowLock<()>> {
        let mut locks = self
            .inner
            .row_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(product_id).or_default().clone()
    }

    /// Make every movement insert fail after the product row is locked.
    ///
    /// Test hook for exercising rollback; no production path calls it.
    pub fn fail_movement_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_product(&self, code: &str, name: &str, min_stock: i32, current_stock: i32) -> i32 {
        let mut state = self.state();
        let id = state.allocate_id();
        let now = Utc::now();
        state.products.insert(
            id,
            Product {
                id,
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                category: "General".to_string(),
                unit: "pieza".to_string(),
                min_stock,
                current_stock,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn insert_supplier(&self, name: &str) -> i32 {
        let mut state = self.state();
        let id = state.allocate_id();
        state.suppliers.insert(id, name.to_string());
        id
    }

    pub fn insert_client(&self, name: &str) -> i32 {
        let mut state = self.state();
        let id = state.allocate_id();
        state.clients.insert(id, name.to_string());
        id
    }

    pub fn insert_user(&self, email: &str, role: Role, is_logged_in: bool) -> i32 {
        let mut state = self.state();
        let id = state.allocate_id();
        state.users.insert(
            id,
            SeedUser {
                email: email.to_string(),
                role,
                is_logged_in,
            },
        );
        id
    }

    pub fn set_logged_in(&self, user_id: i32, is_logged_in: bool) {
        if let Some(user) = self.state().users.get_mut(&user_id) {
            user.is_logged_in = is_logged_in;
        }
    }

    /// Committed stock level of a product
    pub fn product_stock(&self, product_id: i32) -> Option<i32> {
        self.state()
            .products
            .get(&product_id)
            .map(|p| p.current_stock)
    }

    /// Every committed movement, in insertion order
    pub fn movements(&self) -> Vec<Movement> {
        self.state().movements.clone()
    }

    /// Every recorded alert, in insertion order
    pub fn alerts(&self) -> Vec<StockAlert> {
        self.state().alerts.clone()
    }
}

/// Transaction over an [`InMemoryStore`]
pub struct MemoryTx {
    store: InMemoryStore,
    held: HashMap<i32, OwnedMutexGuard<()>>,
    movements: Vec<Movement>,
    stock: HashMap<i32, i32>,
}

impl MemoryTx {
    fn check_references(&self, state: &State, movement: &NewMovement) -> AppResult<()> {
        let (supplier_id, client_id) = movement.counterparties();
        if !state.products.contains_key(&movement.product_id) {
            return Err(AppError::ReferenceViolation(
                "movements_product_id_fkey".to_string(),
            ));
        }
        if !state.users.contains_key(&movement.user_id) {
            return Err(AppError::ReferenceViolation(
                "movements_user_id_fkey".to_string(),
            ));
        }
        if let Some(id) = supplier_id {
            if !state.suppliers.contains_key(&id) {
                return Err(AppError::ReferenceViolation(
                    "movements_supplier_id_fkey".to_string(),
                ));
            }
        }
        if let Some(id) = client_id {
            if !state.clients.contains_key(&id) {
                return Err(AppError::ReferenceViolation(
                    "movements_client_id_fkey".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MovementTx for MemoryTx {
    async fn lock_product(&mut self, product_id: i32) -> AppResult<Option<LockedProduct>> {
        if !self.store.state().products.contains_key(&product_id) {
            return Ok(None);
        }

        if !self.held.contains_key(&product_id) {
            let guard = self.store.row_lock(product_id).lock_owned().await;
            self.held.insert(product_id, guard);
        }

        let state = self.store.state();
        Ok(state.products.get(&product_id).map(|p| LockedProduct {
            id: p.id,
            name: p.name.clone(),
            current_stock: self.stock.get(&p.id).copied().unwrap_or(p.current_stock),
            min_stock: p.min_stock,
        }))
    }

    async fn insert_movement(&mut self, movement: &NewMovement) -> AppResult<Movement> {
        if self.store.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated write failure".to_string()));
        }

        let mut state = self.store.state();
        self.check_references(&state, movement)?;

        let (supplier_id, client_id) = movement.counterparties();
        let inserted = Movement {
            id: state.allocate_id(),
            occurred_at: Utc::now(),
            movement_type: movement.movement_type,
            product_id: movement.product_id,
            quantity: movement.quantity,
            reference: movement.reference.clone(),
            responsible_name: movement.responsible_name.clone(),
            supplier_id,
            client_id,
            user_id: movement.user_id,
        };
        drop(state);

        self.movements.push(inserted.clone());
        Ok(inserted)
    }

    async fn update_stock(&mut self, product_id: i32, new_stock: i32) -> AppResult<()> {
        if new_stock < 0 {
            return Err(AppError::Internal(
                "products_current_stock_check violated".to_string(),
            ));
        }
        self.stock.insert(product_id, new_stock);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        let mut state = this.store.state();
        let now = Utc::now();
        for (product_id, stock) in &this.stock {
            if let Some(product) = state.products.get_mut(product_id) {
                product.current_stock = *stock;
                product.updated_at = now;
            }
        }
        state.movements.extend(this.movements);
        drop(state);
        drop(this.held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl MovementStore for InMemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn MovementTx>> {
        Ok(Box::new(MemoryTx {
            store: self.clone(),
            held: HashMap::new(),
            movements: Vec::new(),
            stock: HashMap::new(),
        }))
    }

    async fn product_exists(&self, product_id: i32) -> AppResult<bool> {
        Ok(self.state().products.contains_key(&product_id))
    }

    async fn movements_for_product(&self, product_id: i32) -> AppResult<Vec<Movement>> {
        let mut movements: Vec<Movement> = self
            .state()
            .movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect();
        movements.sort_by(|a, b| (b.occurred_at, b.id).cmp(&(a.occurred_at, a.id)));
        Ok(movements)
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn active_admin_email(&self) -> AppResult<Option<String>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.role == Role::Admin && u.is_logged_in)
            .map(|u| u.email.clone()))
    }

    async fn record_alert(&self, alert: &NewStockAlert) -> AppResult<StockAlert> {
        let mut state = self.state();
        let (code, name) = state
            .products
            .get(&alert.product_id)
            .map(|p| (p.code.clone(), p.name.clone()))
            .ok_or_else(|| {
                AppError::ReferenceViolation("stock_alerts_product_id_fkey".to_string())
            })?;

        let recorded = StockAlert {
            id: state.allocate_id(),
            product_id: alert.product_id,
            product_code: code,
            product_name: name,
            stock_level: alert.stock_level,
            min_stock: alert.min_stock,
            responsible_name: alert.responsible_name.clone(),
            recipient: alert.recipient.clone(),
            notified: alert.notified,
            created_at: Utc::now(),
        };
        state.alerts.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_alerts(&self) -> AppResult<Vec<StockAlert>> {
        let mut alerts = self.state().alerts.clone();
        alerts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(alerts)
    }

    async fn low_stock_products(&self) -> AppResult<Vec<Product>> {
        Ok(self
            .state()
            .products
            .values()
            .filter(|p| p.is_below_minimum())
            .cloned()
            .collect())
    }
}
