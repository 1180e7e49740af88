//! Inventory platform server

use inventory_backend::{
    create_app,
    external::{mailer_from_config, GeoLocationClient},
    services::{spawn_low_stock_worker, AlertService, LocationRecorder, MovementService},
    store::PgStore,
    AppState, Config,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time allowed for queued low-stock mail after the listener stops
const ALERT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inventory_server=debug,inventory_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting inventory server");
    tracing::info!("Environment: {}", config.environment);

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let mailer = mailer_from_config(&config.mail)?;
    let store = Arc::new(PgStore::new(db_pool.clone()));

    let (notifier, alert_worker) = spawn_low_stock_worker(
        config.alerts.queue_capacity,
        store.clone(),
        mailer.clone(),
        config.mail.fallback_recipient.clone(),
        Duration::from_secs(config.mail.request_timeout_secs),
    );

    let state = AppState {
        db: db_pool.clone(),
        config: Arc::new(config.clone()),
        movements: MovementService::new(store.clone(), notifier),
        alerts: AlertService::new(store, mailer.clone(), config.mail.fallback_recipient.clone()),
        mailer,
        locations: LocationRecorder::new(
            db_pool.clone(),
            GeoLocationClient::new(
                config.geolocation.api_endpoint.clone(),
                Duration::from_secs(config.geolocation.request_timeout_secs),
            )?,
            config.geolocation.fallback_ip.clone(),
        ),
    };

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned the last notifier, so the worker drains and exits
    match tokio::time::timeout(ALERT_DRAIN_TIMEOUT, alert_worker).await {
        Ok(Ok(())) => tracing::info!("Low-stock worker stopped"),
        Ok(Err(e)) => tracing::error!("Low-stock worker failed: {}", e),
        Err(_) => tracing::warn!("Low-stock worker did not drain in time"),
    }

    db_pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
