//! HTTP handlers for stock movements

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{Movement, RawMovementInput};

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::CurrentUser;
use crate::services::MovementOutcome;
use crate::AppState;

#[derive(Serialize)]
pub struct RegisterMovementResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: MovementOutcome,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementHistoryRequest {
    pub product_id: Option<Value>,
}

#[derive(Serialize)]
pub struct MovementHistoryResponse {
    pub success: bool,
    pub movements: Vec<Movement>,
    pub total: usize,
}

/// Register an inbound or outbound stock movement
pub async fn register_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<RawMovementInput>,
) -> AppResult<(StatusCode, Json<RegisterMovementResponse>)> {
    current_user.0.require_writer()?;

    let outcome = state.movements.register_movement(&input).await?;
    let message = format!(
        "{} movement registered. New stock: {}",
        outcome.movement_type, outcome.new_stock
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterMovementResponse {
            success: true,
            message,
            outcome,
        }),
    ))
}

/// Movement history of one product, newest first
pub async fn movement_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    JsonBody(input): JsonBody<MovementHistoryRequest>,
) -> AppResult<Json<MovementHistoryResponse>> {
    let history = state
        .movements
        .get_movements_by_product(input.product_id.as_ref())
        .await?;

    Ok(Json(MovementHistoryResponse {
        success: true,
        movements: history.movements,
        total: history.total,
    }))
}
