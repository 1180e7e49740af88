//! HTTP handlers for stock alerts

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{Product, StockAlert};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Serialize)]
pub struct StockAlertListResponse {
    pub success: bool,
    pub data: Vec<StockAlert>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct LowStockResponse {
    pub success: bool,
    pub count: usize,
    pub products: Vec<Product>,
    pub message: String,
}

#[derive(Serialize)]
pub struct DigestResponse {
    pub success: bool,
    pub sent: bool,
    pub count: usize,
    pub message: String,
}

/// Recorded low-stock events, newest first
pub async fn list_stock_alerts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<StockAlertListResponse>> {
    let alerts = state.alerts.list_stock_alerts().await?;
    Ok(Json(StockAlertListResponse {
        success: true,
        count: alerts.len(),
        data: alerts,
    }))
}

/// Products currently below their minimum stock
pub async fn list_low_stock_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<LowStockResponse>> {
    let products = state.alerts.low_stock_products().await?;
    let message = if products.is_empty() {
        "Every product is at or above its minimum stock".to_string()
    } else {
        format!("{} product(s) below minimum stock", products.len())
    };

    Ok(Json(LowStockResponse {
        success: true,
        count: products.len(),
        products,
        message,
    }))
}

/// Email the low-stock report on demand
pub async fn send_low_stock_digest(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DigestResponse>> {
    current_user.0.require_writer()?;

    let outcome = state.alerts.send_low_stock_digest().await?;
    Ok(Json(DigestResponse {
        success: true,
        sent: outcome.sent,
        count: outcome.product_count,
        message: outcome.message,
    }))
}
