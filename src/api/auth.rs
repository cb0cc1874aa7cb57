use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::session::USER_KEY;
use crate::domain::{SessionContext, SessionUser};
use crate::services::{AuthError, Registration, UserInfo};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub confirm_email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Same message for unknown email and wrong password.
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::UserNotFound | AuthError::Unauthorized => Self::unauthorized(),
            AuthError::AlreadyExists => Self::Conflict("User already exists".to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Session plumbing
// ============================================================================

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(format!("Session layer missing: {msg}")))?;

        let user = session
            .get::<SessionUser>(USER_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

        Ok(user.map_or_else(SessionContext::anonymous, SessionContext::authenticated))
    }
}

/// Rejects anonymous callers and tags the request span with the user id.
pub async fn auth_middleware(ctx: SessionContext, request: Request, next: Next) -> Response {
    match ctx.current_user_id() {
        Some(id) => {
            tracing::Span::current().record("user_id", id.value());
            next.run(request).await
        }
        None => ApiError::unauthorized().into_response(),
    }
}

/// Stores the user in a fresh session id.
pub(super) async fn start_session(session: &Session, user: UserInfo) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to cycle session: {e}")))?;

    session
        .insert(USER_KEY, SessionUser::from(user))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .auth_service()
        .register(Registration {
            name: payload.name,
            email: payload.email,
            confirm_email: payload.confirm_email,
            password: payload.password,
        })
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    start_session(&session, user.clone()).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse::new("Logged out"))))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.auth_service().current_user(&ctx).await?;
    Ok(Json(ApiResponse::success(user)))
}
