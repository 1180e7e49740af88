//! User administration handlers (admin only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::User;

use super::product::MessageResponse;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::CurrentUser;
use crate::services::user::{CreateUserInput, CreatedUser, UpdateUserInput};
use crate::services::UserService;
use crate::AppState;

#[derive(Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<User>,
}

#[derive(Serialize)]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub created: CreatedUser,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserListResponse>> {
    current_user.0.require_admin()?;

    let users = UserService::new(state.db).list_users().await?;
    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<CreateUserInput>,
) -> AppResult<(StatusCode, Json<CreateUserResponse>)> {
    current_user.0.require_admin()?;

    let created = UserService::new(state.db).create_user(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            success: true,
            message: "User created".to_string(),
            created,
        }),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(input): JsonBody<UpdateUserInput>,
) -> AppResult<Json<UserResponse>> {
    current_user.0.require_admin()?;

    let user = UserService::new(state.db).update_user(&input).await?;
    Ok(Json(UserResponse {
        success: true,
        message: "User updated".to_string(),
        user,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    current_user.0.require_admin()?;

    UserService::new(state.db).delete_user(user_id).await?;
    Ok(MessageResponse::ok("User deleted"))
}
