//! Location audit handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shared::UserLocation;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Serialize)]
pub struct LocationListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<UserLocation>,
}

pub async fn get_user_locations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<LocationListResponse>> {
    current_user.0.require_admin()?;

    let locations = state.locations.list_for_user(user_id).await?;
    Ok(Json(LocationListResponse {
        success: true,
        count: locations.len(),
        data: locations,
    }))
}
