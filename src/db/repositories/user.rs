use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::reset::{ResetState, ResetTicket};
use crate::entities::{prelude::*, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Insert a new account; hashing runs on the blocking pool.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = Utc::now();
        let active = users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            is_admin: Set(false),
            reset_token: Set(None),
            reset_token_expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn admin_count(&self) -> Result<u64> {
        Users::find()
            .filter(users::Column::IsAdmin.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count admins")
    }

    pub async fn set_admin(&self, id: i32, is_admin: bool) -> Result<bool> {
        let result = Users::update_many()
            .set(users::ActiveModel {
                is_admin: Set(is_admin),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update admin flag")?;

        Ok(result.rows_affected > 0)
    }

    /// Verify credentials; returns the user only when the password matches.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_password_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Store a reset ticket, replacing whatever was pending before.
    pub async fn set_reset_ticket(&self, id: i32, ticket: &ResetTicket) -> Result<bool> {
        let result = Users::update_many()
            .set(users::ActiveModel {
                reset_token: Set(Some(ticket.token.clone())),
                reset_token_expires_at: Set(Some(ticket.expires_at)),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store reset token")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<(User, ResetState)>> {
        let user = Users::find()
            .filter(users::Column::ResetToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")?;

        Ok(user.map(|u| {
            let state = ResetState::from_columns(u.reset_token.clone(), u.reset_token_expires_at);
            (User::from(u), state)
        }))
    }

    pub async fn get_reset_state(&self, id: i32) -> Result<Option<ResetState>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query reset state")?;

        Ok(user.map(|u| ResetState::from_columns(u.reset_token, u.reset_token_expires_at)))
    }

    /// Swap in a new password and clear the token, but only while `token`
    /// is still the one stored. Returns false when it was replaced meanwhile.
    pub async fn consume_reset_token(
        &self,
        token: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let result = Users::update_many()
            .set(users::ActiveModel {
                password_hash: Set(new_hash),
                reset_token: Set(None),
                reset_token_expires_at: Set(None),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(users::Column::ResetToken.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to apply password reset")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn clear_reset_token(&self, token: &str) -> Result<bool> {
        let result = Users::update_many()
            .set(users::ActiveModel {
                reset_token: Set(None),
                reset_token_expires_at: Set(None),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(users::Column::ResetToken.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to clear reset token")?;

        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Parameters are read back from the PHC string, so hashes made with older
/// settings still verify.
pub fn verify_password_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("pw1234", &cheap_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password_hash("pw1234", &hash).unwrap());
        assert!(!verify_password_hash("pw12345", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password_hash("pw", "not-a-hash").is_err());
    }
}
