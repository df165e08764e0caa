use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{AuthResponse, LoginRequest, RegisterRequest},
};
use crate::shared::{AppError, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.document_repository),
        Arc::clone(&state.invitation_repository),
    )
}

/// HTTP handler for creating an account
///
/// POST /register
/// Returns a JWT token and the new user's public profile
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!(email = %request.email, "Registering new user");

    let response = auth_service(&state)
        .register(&request.email, &request.password)
        .await?;

    info!(user_id = %response.user.id, "User registered successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

/// HTTP handler for logging in
///
/// POST /login
/// Returns a JWT token and the user's public profile
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!(email = %request.email, "Logging in user");

    let response = auth_service(&state)
        .login(&request.email, &request.password)
        .await?;

    info!(user_id = %response.user.id, "User logged in successfully");
    Ok(Json(response))
}
