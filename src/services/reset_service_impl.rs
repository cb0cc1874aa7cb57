//! `SeaORM` implementation of the `PasswordResetService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::constants::limits::MIN_PASSWORD_LEN;
use crate::constants::reset::MAX_TTL_MINUTES;
use crate::db::Store;
use crate::domain::UserId;
use crate::domain::reset::{Clock, ConsumeDecision, ResetState, ResetTicket, decide, looks_like_token};
use crate::services::auth_service::UserInfo;
use crate::services::mail::Mailer;
use crate::services::reset_service::{
    PasswordResetError, PasswordResetService, ResetIssued, TokenStatus,
};

pub struct SeaOrmPasswordResetService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    security: SecurityConfig,
    public_url: String,
}

impl SeaOrmPasswordResetService {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        security: SecurityConfig,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            clock,
            security,
            public_url: public_url.into(),
        }
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/reset/{token}", self.public_url.trim_end_matches('/'))
    }

    fn ttl(&self) -> Result<Duration, PasswordResetError> {
        let minutes = self.security.password_reset.token_ttl_minutes;
        if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
            return Err(PasswordResetError::Internal(format!(
                "Reset token TTL out of range: {minutes} minutes"
            )));
        }
        Ok(Duration::minutes(minutes))
    }
}

fn record_consume(outcome: &'static str) {
    metrics::counter!("password_reset_consumed_total", "outcome" => outcome).increment(1);
}

#[async_trait]
impl PasswordResetService for SeaOrmPasswordResetService {
    async fn request_reset(&self, email: &str) -> Result<ResetIssued, PasswordResetError> {
        let user = self
            .store
            .get_user_by_email(email.trim())
            .await?
            .ok_or(PasswordResetError::NotFound)?;

        let user_id = UserId::new(user.id);
        let ttl = self.ttl()?;
        let ticket = ResetTicket::issue(self.clock.now(), ttl);

        // Commit first: the mail only ever carries a token that is stored.
        if !self.store.set_reset_ticket(user_id, &ticket).await? {
            return Err(PasswordResetError::NotFound);
        }

        metrics::counter!("password_reset_requests_total").increment(1);
        info!(user_id = %user_id, expires_at = %ticket.expires_at, "Issued password reset token");

        let link = self.reset_link(&ticket.token);
        let mail_sent = match self
            .mailer
            .send_password_reset(&user.email, &user.name, &link)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Password reset mail not delivered; token stays valid");
                false
            }
        };

        Ok(ResetIssued {
            user_id,
            expires_at: ticket.expires_at,
            mail_sent,
        })
    }

    async fn consume_reset(
        &self,
        token: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<UserInfo, PasswordResetError> {
        if password != password_confirmation {
            return Err(PasswordResetError::Mismatch);
        }

        if password.trim().chars().count() < MIN_PASSWORD_LEN {
            return Err(PasswordResetError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if !looks_like_token(token) {
            debug!("Rejected malformed reset token");
            return Err(PasswordResetError::NotFound);
        }

        let (user, state) = self
            .store
            .find_user_by_reset_token(token)
            .await?
            .ok_or(PasswordResetError::NotFound)?;

        let ResetState::Pending { expires_at, .. } = state else {
            return Err(PasswordResetError::NotFound);
        };

        match decide(expires_at, self.clock.now()) {
            ConsumeDecision::Apply => {
                let applied = self
                    .store
                    .consume_reset_token(token, password, &self.security)
                    .await?;

                // Another request replaced the token between lookup and update.
                if !applied {
                    record_consume("superseded");
                    return Err(PasswordResetError::NotFound);
                }

                record_consume("consumed");
                info!(user_id = user.id, "Password changed through reset token");
                Ok(UserInfo::from(user))
            }
            ConsumeDecision::Expired => {
                self.store.clear_reset_token(token).await?;
                record_consume("expired");
                info!(user_id = user.id, "Cleared expired password reset token");
                Err(PasswordResetError::Expired)
            }
        }
    }

    async fn token_status(&self, token: &str) -> Result<TokenStatus, PasswordResetError> {
        if !looks_like_token(token) {
            return Err(PasswordResetError::NotFound);
        }

        let (_, state) = self
            .store
            .find_user_by_reset_token(token)
            .await?
            .ok_or(PasswordResetError::NotFound)?;

        match state {
            ResetState::Pending { expires_at, .. } => Ok(TokenStatus {
                valid: decide(expires_at, self.clock.now()) == ConsumeDecision::Apply,
                expires_at,
            }),
            ResetState::NoRequest => Err(PasswordResetError::NotFound),
        }
    }
}
