//! Authentication handlers

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use shared::LocationAction;
use std::net::SocketAddr;

use super::product::MessageResponse;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::CurrentUser;
use crate::services::auth::{
    ForgotPasswordInput, LoginChallenge, LoginInput, ResetPasswordInput, Session, VerifyInput,
};
use crate::services::location::extract_client_ip;
use crate::services::AuthService;
use crate::AppState;

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(flatten)]
    pub challenge: LoginChallenge,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub session: Session,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.mailer.clone(), &state.config)
}

/// Password check; the second factor is requested next
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let challenge = auth_service(&state).login(&input).await?;

    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    state.locations.record(
        challenge.user_id,
        LocationAction::Login,
        extract_client_ip(&headers, peer),
    );

    Ok(Json(LoginResponse {
        success: true,
        challenge,
    }))
}

/// Second factor check; issues the access token
pub async fn verify_two_factor(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<VerifyInput>,
) -> AppResult<Json<SessionResponse>> {
    let session = auth_service(&state).verify_two_factor(&input).await?;
    Ok(Json(SessionResponse {
        success: true,
        session,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    auth_service(&state).logout(current_user.0.user_id).await?;
    Ok(MessageResponse::ok("Signed out"))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<ForgotPasswordInput>,
) -> AppResult<Json<MessageResponse>> {
    let user_id = auth_service(&state).forgot_password(&input).await?;

    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    state.locations.record(
        user_id,
        LocationAction::ForgotPasswordRequest,
        extract_client_ip(&headers, peer),
    );

    Ok(MessageResponse::ok(
        "A password reset link has been sent to your email",
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<ResetPasswordInput>,
) -> AppResult<Json<MessageResponse>> {
    let user_id = auth_service(&state).reset_password(&token, &input).await?;

    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    state.locations.record(
        user_id,
        LocationAction::PasswordReset,
        extract_client_ip(&headers, peer),
    );

    Ok(MessageResponse::ok("Password updated"))
}
