//! Domain service for the password reset flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::UserId;
use crate::services::auth_service::UserInfo;

#[derive(Debug, Error)]
pub enum PasswordResetError {
    #[error("Passwords do not match")]
    Mismatch,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid or unknown reset token")]
    NotFound,

    #[error("Token expired, request a new one")]
    Expired,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PasswordResetError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PasswordResetError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Outcome of a reset request. The token itself only travels by mail.
#[derive(Debug, Clone, Serialize)]
pub struct ResetIssued {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub mail_sent: bool,
}

/// Read-only view of a token, used before showing the new password form.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStatus {
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Issues a fresh token for the account and mails the link.
    ///
    /// Any earlier token of the same account stops working. Mail delivery is
    /// best effort and never revokes the stored token.
    async fn request_reset(&self, email: &str) -> Result<ResetIssued, PasswordResetError>;

    /// Sets a new password if the token is still pending and unexpired.
    ///
    /// An expired token is cleared and [`PasswordResetError::Expired`] returned.
    async fn consume_reset(
        &self,
        token: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<UserInfo, PasswordResetError>;

    /// Reports whether a token is pending without changing anything.
    async fn token_status(&self, token: &str) -> Result<TokenStatus, PasswordResetError>;
}
