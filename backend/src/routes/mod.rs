//! Route definitions for the inventory API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use shared::{Client, Supplier};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/products", product_routes(state.clone()))
        .nest("/suppliers", party_routes::<Supplier>(state.clone()))
        .nest("/clients", party_routes::<Client>(state.clone()))
        .nest("/movements", movement_routes(state.clone()))
        .nest("/alerts", alert_routes(state.clone()))
        .nest("/locations", location_routes(state))
}

/// Sign-in and password recovery; only logout needs a session
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/verify-2fa", post(handlers::verify_two_factor))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password/:token", post(handlers::reset_password))
        .merge(protected)
}

/// User administration routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_users)
                .post(handlers::create_user)
                .put(handlers::update_user),
        )
        .route("/:user_id", delete(handlers::delete_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product catalog and stock level routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products)
                .post(handlers::create_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/status", put(handlers::change_product_status))
        .route("/stock-alert", get(handlers::list_stock_alerts))
        .route("/low-stock", get(handlers::list_low_stock_products))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supplier or client routes (protected)
fn party_routes<T: crate::services::party::PartyRecord>(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_parties::<T>)
                .post(handlers::create_party::<T>)
                .put(handlers::update_party::<T>)
                .delete(handlers::delete_party::<T>),
        )
        .route("/detail", post(handlers::search_parties::<T>))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock movement routes (protected)
fn movement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register_movement))
        .route("/history", post(handlers::movement_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Low-stock report routes (protected)
fn alert_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/test-send", post(handlers::send_low_stock_digest))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Location audit routes (protected)
fn location_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(handlers::get_user_locations))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
