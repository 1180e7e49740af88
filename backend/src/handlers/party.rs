//! HTTP handlers for suppliers and clients
//!
//! Each handler is generic over the counterparty record and is mounted once
//! per table.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use shared::RawPartyInput;

use super::product::{IdRequest, MessageResponse};
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::CurrentUser;
use crate::services::party::{PartyRecord, PartySearchInput, PartyService};
use crate::AppState;

#[derive(Serialize)]
pub struct PartyListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

#[derive(Serialize)]
pub struct PartyResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

pub async fn list_parties<T: PartyRecord>(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<PartyListResponse<T>>> {
    let records = PartyService::<T>::new(state.db).list().await?;
    Ok(Json(PartyListResponse {
        success: true,
        count: records.len(),
        data: records,
    }))
}

pub async fn create_party<T: PartyRecord>(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<RawPartyInput>,
) -> AppResult<(StatusCode, Json<PartyResponse<T>>)> {
    current_user.0.require_writer()?;

    let record = PartyService::<T>::new(state.db).create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(PartyResponse {
            success: true,
            message: format!("{} created", T::LABEL),
            data: record,
        }),
    ))
}

pub async fn search_parties<T: PartyRecord>(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    JsonBody(input): JsonBody<PartySearchInput>,
) -> AppResult<Json<PartyListResponse<T>>> {
    let records = PartyService::<T>::new(state.db).search(&input).await?;
    Ok(Json(PartyListResponse {
        success: true,
        count: records.len(),
        data: records,
    }))
}

pub async fn update_party<T: PartyRecord>(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<RawPartyInput>,
) -> AppResult<Json<PartyResponse<T>>> {
    current_user.0.require_writer()?;

    let record = PartyService::<T>::new(state.db).update(&input).await?;
    Ok(Json(PartyResponse {
        success: true,
        message: format!("{} updated", T::LABEL),
        data: record,
    }))
}

pub async fn delete_party<T: PartyRecord>(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<IdRequest>,
) -> AppResult<Json<MessageResponse>> {
    current_user.0.require_writer()?;

    PartyService::<T>::new(state.db)
        .delete(input.id.as_ref())
        .await?;
    Ok(MessageResponse::ok(format!("{} deleted", T::LABEL)))
}
