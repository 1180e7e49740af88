//! Stock alert log and low-stock reporting

use serde::Serialize;
use shared::{Product, StockAlert};
use std::sync::Arc;

use super::templates;
use crate::external::Mailer;
use crate::error::AppResult;
use crate::store::AlertStore;

#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn AlertStore>,
    mailer: Arc<dyn Mailer>,
    report_recipient: String,
}

/// Outcome of a digest request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestOutcome {
    pub sent: bool,
    pub product_count: usize,
    pub message: String,
}

impl AlertService {
    pub fn new(store: Arc<dyn AlertStore>, mailer: Arc<dyn Mailer>, report_recipient: String) -> Self {
        Self {
            store,
            mailer,
            report_recipient,
        }
    }

    /// Every recorded low-stock event, newest first
    pub async fn list_stock_alerts(&self) -> AppResult<Vec<StockAlert>> {
        self.store.list_alerts().await
    }

    pub async fn low_stock_products(&self) -> AppResult<Vec<Product>> {
        self.store.low_stock_products().await
    }

    /// Email the current list of products below minimum stock.
    ///
    /// Nothing is sent when every product is at or above its minimum. Mail
    /// failures are returned to the caller.
    pub async fn send_low_stock_digest(&self) -> AppResult<DigestOutcome> {
        let products = self.store.low_stock_products().await?;

        if products.is_empty() {
            return Ok(DigestOutcome {
                sent: false,
                product_count: 0,
                message: "No products below minimum stock".to_string(),
            });
        }

        let mail = templates::low_stock_digest(&self.report_recipient, &products);
        self.mailer.send(&mail).await?;

        tracing::info!(
            products = products.len(),
            recipient = %self.report_recipient,
            "Low-stock digest sent"
        );

        Ok(DigestOutcome {
            sent: true,
            product_count: products.len(),
            message: format!(
                "Low-stock report sent to {} ({} product(s))",
                self.report_recipient,
                products.len()
            ),
        })
    }
}
