//! Low-stock notification and alert log tests

use async_trait::async_trait;
use inventory_backend::error::{AppError, AppResult};
use inventory_backend::external::{Mailer, OutgoingMail};
use inventory_backend::services::{
    spawn_low_stock_worker, AlertService, LowStockNotifier, LowStockWorker, MovementService,
};
use inventory_backend::store::{AlertStore, InMemoryStore};
use serde_json::json;
use shared::{LowStockEvent, RawMovementInput, Role};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FALLBACK: &str = "inventario.alertas@gmail.com";
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Mailer that keeps every message, optionally failing each send
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl RecordingMailer {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()> {
        self.sent.lock().unwrap().push(mail.clone());
        if self.fail {
            Err(AppError::ExternalService("mail provider unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Mailer whose first delivery never completes
#[derive(Default)]
struct StallingMailer {
    calls: AtomicUsize,
}

#[async_trait]
impl Mailer for StallingMailer {
    async fn send(&self, _mail: &OutgoingMail) -> AppResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

fn event(product_id: i32, responsible_name: &str) -> LowStockEvent {
    LowStockEvent {
        product_id,
        product_name: "Tornillo <M6>".to_string(),
        stock_level: 2,
        min_stock: 5,
        responsible_name: responsible_name.to_string(),
    }
}

fn worker(store: &InMemoryStore, mailer: Arc<RecordingMailer>) -> LowStockWorker {
    let (_notifier, receiver) = LowStockNotifier::channel(4);
    LowStockWorker::new(
        receiver,
        Arc::new(store.clone()),
        mailer,
        FALLBACK.to_string(),
        SEND_TIMEOUT,
    )
}

// ============================================================================
// Worker
// ============================================================================

#[tokio::test]
async fn test_alert_goes_to_signed_in_admin() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 2);
    store.insert_user("admin.out@gmail.com", Role::Admin, false);
    store.insert_user("editor@gmail.com", Role::Editor, true);
    store.insert_user("admin.in@gmail.com", Role::Admin, true);
    let mailer = Arc::new(RecordingMailer::default());

    worker(&store, mailer.clone())
        .notify_low_stock(&event(product, "Ana"))
        .await;

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "admin.in@gmail.com");

    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].recipient, "admin.in@gmail.com");
    assert!(alerts[0].notified);
    assert_eq!(alerts[0].stock_level, 2);
    assert_eq!(alerts[0].product_code, "TOR-001");
}

#[tokio::test]
async fn test_alert_falls_back_without_signed_in_admin() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 2);
    store.insert_user("admin@gmail.com", Role::Admin, false);
    let mailer = Arc::new(RecordingMailer::default());

    worker(&store, mailer.clone())
        .notify_low_stock(&event(product, "Ana"))
        .await;

    assert_eq!(mailer.sent()[0].to, FALLBACK);
    assert_eq!(store.alerts()[0].recipient, FALLBACK);
}

#[tokio::test]
async fn test_failed_delivery_is_recorded_not_raised() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 2);
    let mailer = Arc::new(RecordingMailer::failing());

    worker(&store, mailer.clone())
        .notify_low_stock(&event(product, "Ana"))
        .await;

    assert_eq!(mailer.sent().len(), 1);
    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(!alerts[0].notified);
}

#[tokio::test]
async fn test_alert_body_escapes_user_input() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 2);
    let mailer = Arc::new(RecordingMailer::default());

    worker(&store, mailer.clone())
        .notify_low_stock(&event(product, "<script>alert(1)</script>"))
        .await;

    let html = &mailer.sent()[0].html;
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("Tornillo &lt;M6&gt;"));
}

#[tokio::test]
async fn test_stalled_delivery_does_not_block_later_alerts() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 2);
    let mailer = Arc::new(StallingMailer::default());

    let (notifier, handle) = spawn_low_stock_worker(
        4,
        Arc::new(store.clone()),
        mailer.clone(),
        FALLBACK.to_string(),
        Duration::from_millis(100),
    );
    assert!(notifier.notify(event(product, "Ana")));
    assert!(notifier.notify(event(product, "Luis")));
    drop(notifier);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker should drain despite the stalled delivery")
        .unwrap();

    assert_eq!(mailer.calls.load(Ordering::SeqCst), 2);
    let alerts = store.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].responsible_name, "Ana");
    assert!(!alerts[0].notified);
    assert_eq!(alerts[1].responsible_name, "Luis");
    assert!(alerts[1].notified);
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_movement_alert_flows_through_worker() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 10);
    let client = store.insert_client("Ferreteria Sol");
    let user = store.insert_user("admin@gmail.com", Role::Admin, true);
    let mailer = Arc::new(RecordingMailer::default());

    let (notifier, handle) = spawn_low_stock_worker(
        8,
        Arc::new(store.clone()),
        mailer.clone(),
        FALLBACK.to_string(),
        SEND_TIMEOUT,
    );
    let service = MovementService::new(Arc::new(store.clone()), notifier);

    let input: RawMovementInput = serde_json::from_value(json!({
        "productId": product,
        "type": "Salida",
        "quantity": 8,
        "responsibleName": "Ana",
        "clientId": client,
        "userId": user,
    }))
    .unwrap();
    let outcome = service.register_movement(&input).await.unwrap();
    assert!(outcome.alert_sent);

    // Dropping the last notifier lets the worker drain and stop
    drop(service);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(mailer.sent().len(), 1);
    let alerts = store.list_alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].product_id, product);
    assert_eq!(alerts[0].stock_level, 2);
}

#[tokio::test]
async fn test_notifier_reports_stopped_worker() {
    let (notifier, receiver) = LowStockNotifier::channel(1);
    drop(receiver);

    assert!(!notifier.notify(event(1, "Ana")));
}

#[tokio::test]
async fn test_notifier_drops_events_when_queue_is_full() {
    let (notifier, _receiver) = LowStockNotifier::channel(1);

    assert!(notifier.notify(event(1, "Ana")));
    assert!(!notifier.notify(event(1, "Ana")));
}

// ============================================================================
// Alert log and digest
// ============================================================================

#[tokio::test]
async fn test_alert_log_lists_newest_first() {
    let store = InMemoryStore::new();
    let product = store.insert_product("TOR-001", "Tornillo", 5, 2);
    let mailer = Arc::new(RecordingMailer::default());
    let worker = worker(&store, mailer.clone());

    worker.notify_low_stock(&event(product, "Ana")).await;
    worker.notify_low_stock(&event(product, "Luis")).await;

    let service = AlertService::new(Arc::new(store.clone()), mailer, FALLBACK.to_string());
    let alerts = service.list_stock_alerts().await.unwrap();

    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].responsible_name, "Luis");
    assert_eq!(alerts[1].responsible_name, "Ana");
}

#[tokio::test]
async fn test_digest_skips_mail_when_nothing_is_low() {
    let store = InMemoryStore::new();
    store.insert_product("TOR-001", "Tornillo", 5, 5);
    let mailer = Arc::new(RecordingMailer::default());
    let service = AlertService::new(Arc::new(store), mailer.clone(), FALLBACK.to_string());

    let outcome = service.send_low_stock_digest().await.unwrap();

    assert!(!outcome.sent);
    assert_eq!(outcome.product_count, 0);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_digest_lists_low_products() {
    let store = InMemoryStore::new();
    store.insert_product("TOR-001", "Tornillo", 5, 1);
    store.insert_product("TUE-001", "Tuerca", 5, 9);
    store.insert_product("ARA-001", "Arandela", 10, 3);
    let mailer = Arc::new(RecordingMailer::default());
    let service = AlertService::new(Arc::new(store), mailer.clone(), FALLBACK.to_string());

    let outcome = service.send_low_stock_digest().await.unwrap();

    assert!(outcome.sent);
    assert_eq!(outcome.product_count, 2);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, FALLBACK);
    assert!(sent[0].html.contains("TOR-001"));
    assert!(sent[0].html.contains("ARA-001"));
    assert!(!sent[0].html.contains("TUE-001"));
}

#[tokio::test]
async fn test_digest_surfaces_mail_failures() {
    let store = InMemoryStore::new();
    store.insert_product("TOR-001", "Tornillo", 5, 1);
    let service = AlertService::new(
        Arc::new(store),
        Arc::new(RecordingMailer::failing()),
        FALLBACK.to_string(),
    );

    let err = service.send_low_stock_digest().await.unwrap_err();
    assert!(matches!(err, AppError::ExternalService(_)));
}
