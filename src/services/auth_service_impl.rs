//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::constants::limits::MIN_PASSWORD_LEN;
use crate::db::Store;
use crate::domain::SessionContext;
use crate::services::auth_service::{AuthError, AuthService, Registration, UserInfo};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

fn validate_registration(registration: &Registration) -> Result<(), AuthError> {
    let email = registration.email.trim();
    let confirm = registration.confirm_email.trim();

    if email.is_empty() || confirm.is_empty() {
        return Err(AuthError::Validation(
            "Email and email confirmation are required".to_string(),
        ));
    }

    if email != confirm {
        return Err(AuthError::Validation("Emails do not match".to_string()));
    }

    if !email.contains('@') {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if registration.password.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<UserInfo, AuthError> {
        validate_registration(&registration)?;

        let email = registration.email.trim();
        let name = registration.name.trim();

        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let mut user = self
            .store
            .create_user(name, email, &registration.password, &self.security)
            .await?;

        // First account on a fresh install runs the kitchen.
        if self.store.admin_count().await? == 0 {
            self.store
                .set_user_admin(user.id.into(), true)
                .await?;
            user.is_admin = true;
            info!(user_id = user.id, "Promoted first account to admin");
        }

        info!(user_id = user.id, "Registered new account");
        Ok(UserInfo::from(user))
    }

    async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .verify_user_password(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(UserInfo::from(user))
    }

    async fn current_user(&self, ctx: &SessionContext) -> Result<UserInfo, AuthError> {
        let id = ctx.current_user_id().ok_or(AuthError::Unauthorized)?;

        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo::from(user))
    }
}
