//! Low-stock notification pipeline
//!
//! Movement processing hands [`LowStockEvent`]s to a [`LowStockNotifier`]
//! without waiting. A single [`LowStockWorker`] task picks a recipient, sends
//! the alert email and appends the outcome to the alert log. Failures are
//! logged and never reach the request that raised the event.

use shared::{LowStockEvent, NewStockAlert};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::templates;
use crate::external::Mailer;
use crate::store::AlertStore;

/// Cheap, clonable handle used to enqueue low-stock events
#[derive(Clone)]
pub struct LowStockNotifier {
    sender: mpsc::Sender<LowStockEvent>,
}

impl LowStockNotifier {
    /// Create a notifier and the receiving end its worker consumes
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LowStockEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue an event without waiting. Returns whether it was accepted.
    pub fn notify(&self, event: LowStockEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    product_id = event.product_id,
                    "Low-stock queue full, alert dropped"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    product_id = event.product_id,
                    "Low-stock worker stopped, alert dropped"
                );
                false
            }
        }
    }
}

/// Background consumer of low-stock events
pub struct LowStockWorker {
    receiver: mpsc::Receiver<LowStockEvent>,
    alerts: Arc<dyn AlertStore>,
    mailer: Arc<dyn Mailer>,
    fallback_recipient: String,
    send_timeout: Duration,
}

impl LowStockWorker {
    pub fn new(
        receiver: mpsc::Receiver<LowStockEvent>,
        alerts: Arc<dyn AlertStore>,
        mailer: Arc<dyn Mailer>,
        fallback_recipient: String,
        send_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            alerts,
            mailer,
            fallback_recipient,
            send_timeout,
        }
    }

    /// Process events until every notifier handle has been dropped
    pub async fn run(mut self) {
        tracing::info!("Low-stock worker started");
        while let Some(event) = self.receiver.recv().await {
            self.notify_low_stock(&event).await;
        }
        tracing::info!("Low-stock worker stopped");
    }

    /// Deliver one alert and record the outcome
    pub async fn notify_low_stock(&self, event: &LowStockEvent) {
        let recipient = self.resolve_recipient().await;
        let mail = templates::low_stock_alert(&recipient, event);

        // A stalled provider must not hold up the events queued behind this one
        let delivery = tokio::time::timeout(self.send_timeout, self.mailer.send(&mail)).await;

        let notified = match delivery {
            Ok(Ok(())) => {
                tracing::info!(
                    product_id = event.product_id,
                    recipient = %recipient,
                    "Low-stock alert sent"
                );
                true
            }
            Ok(Err(e)) => {
                tracing::error!(
                    product_id = event.product_id,
                    recipient = %recipient,
                    "Failed to send low-stock alert: {}",
                    e
                );
                false
            }
            Err(_) => {
                tracing::error!(
                    product_id = event.product_id,
                    recipient = %recipient,
                    timeout_secs = self.send_timeout.as_secs_f64(),
                    "Low-stock alert delivery timed out"
                );
                false
            }
        };

        let record = NewStockAlert {
            product_id: event.product_id,
            stock_level: event.stock_level,
            min_stock: event.min_stock,
            responsible_name: event.responsible_name.clone(),
            recipient,
            notified,
        };
        if let Err(e) = self.alerts.record_alert(&record).await {
            tracing::error!(
                product_id = event.product_id,
                "Failed to record low-stock alert: {}",
                e
            );
        }
    }

    /// A signed-in administrator, else the operational inbox
    async fn resolve_recipient(&self) -> String {
        match self.alerts.active_admin_email().await {
            Ok(Some(email)) => email,
            Ok(None) => {
                tracing::debug!("No administrator signed in, using fallback recipient");
                self.fallback_recipient.clone()
            }
            Err(e) => {
                tracing::warn!("Administrator lookup failed, using fallback recipient: {}", e);
                self.fallback_recipient.clone()
            }
        }
    }
}

/// Create the notifier handle and spawn its worker.
///
/// The worker exits once every clone of the returned notifier is dropped.
pub fn spawn_low_stock_worker(
    capacity: usize,
    alerts: Arc<dyn AlertStore>,
    mailer: Arc<dyn Mailer>,
    fallback_recipient: String,
    send_timeout: Duration,
) -> (LowStockNotifier, JoinHandle<()>) {
    let (notifier, receiver) = LowStockNotifier::channel(capacity);
    let worker = LowStockWorker::new(receiver, alerts, mailer, fallback_recipient, send_timeout);
    (notifier, tokio::spawn(worker.run()))
}
