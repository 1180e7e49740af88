//! HTTP handlers for the product catalog

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{Product, RawProductInput};

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::CurrentUser;
use crate::services::product::ProductStatusInput;
use crate::services::ProductService;
use crate::AppState;

#[derive(Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub count: usize,
    pub products: Vec<Product>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub message: String,
    pub product: Product,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Body of delete requests identifying a row by id
#[derive(Debug, Default, Deserialize)]
pub struct IdRequest {
    pub id: Option<Value>,
}

pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ProductListResponse>> {
    let products = ProductService::new(state.db).list_products().await?;
    Ok(Json(ProductListResponse {
        success: true,
        count: products.len(),
        products,
    }))
}

pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<RawProductInput>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    current_user.0.require_writer()?;

    let product = ProductService::new(state.db).create_product(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: "Product created".to_string(),
            product,
        }),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<RawProductInput>,
) -> AppResult<Json<ProductResponse>> {
    current_user.0.require_writer()?;

    let product = ProductService::new(state.db).update_product(&input).await?;
    Ok(Json(ProductResponse {
        success: true,
        message: "Product updated".to_string(),
        product,
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<IdRequest>,
) -> AppResult<Json<MessageResponse>> {
    current_user.0.require_writer()?;

    ProductService::new(state.db)
        .delete_product(input.id.as_ref())
        .await?;
    Ok(MessageResponse::ok("Product deleted"))
}

pub async fn change_product_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<ProductStatusInput>,
) -> AppResult<Json<ProductListResponse>> {
    current_user.0.require_writer()?;

    let products = ProductService::new(state.db).set_status(&input).await?;
    Ok(Json(ProductListResponse {
        success: true,
        count: products.len(),
        products,
    }))
}
