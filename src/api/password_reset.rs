//! Password reset endpoints.
//!
//! Requesting a reset always answers with the same message once the account
//! exists; the token only ever travels by mail.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::start_session;
use crate::api::{ApiError, ApiResponse, AppState};
use crate::services::{PasswordResetError, TokenStatus, UserInfo};

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Serialize)]
pub struct ResetRequested {
    pub message: String,
}

impl From<PasswordResetError> for ApiError {
    fn from(err: PasswordResetError) -> Self {
        match err {
            PasswordResetError::Mismatch => Self::validation("Passwords do not match"),
            PasswordResetError::Validation(msg) => Self::validation(msg),
            PasswordResetError::NotFound => {
                Self::NotFound("Unknown account or reset link".to_string())
            }
            PasswordResetError::Expired => {
                Self::Expired("Token expired, request a new one".to_string())
            }
            PasswordResetError::Database(msg) => Self::DatabaseError(msg),
            PasswordResetError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// POST /password-reset
pub async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ApiResponse<ResetRequested>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    state.reset_service().request_reset(&payload.email).await?;

    Ok(Json(ApiResponse::success(ResetRequested {
        message: "A reset link has been sent to your email address".to_string(),
    })))
}

/// GET /password-reset/{token}
pub async fn token_status(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<TokenStatus>>, ApiError> {
    let status = state.reset_service().token_status(&token).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /password-reset/{token}
///
/// On success the caller is logged in as the account owner.
pub async fn consume_reset(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    session: Session,
    Json(payload): Json<NewPasswordRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .reset_service()
        .consume_reset(&token, &payload.password, &payload.password_confirmation)
        .await?;

    start_session(&session, user.clone()).await?;

    Ok(Json(ApiResponse::success(user)))
}
