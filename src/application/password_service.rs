use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use crate::infrastructure::mail::{Mailer, password_reset_mail};
use crate::infrastructure::security::{generate_reset_token, hash_password};
use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub struct PasswordService<R: UserRepository> {
    user_repository: Arc<R>,
    mailer: Arc<dyn Mailer>,
    reset_token_ttl: Duration,
}

impl<R: UserRepository> PasswordService<R> {
    pub fn new(user_repository: Arc<R>, mailer: Arc<dyn Mailer>, reset_token_ttl: Duration) -> Self {
        Self {
            user_repository,
            mailer,
            reset_token_ttl,
        }
    }

    /// Creates the account, or replaces its password if the email is already known.
    #[instrument(skip(self, password), fields(email = email))]
    pub async fn seed_user(&self, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password).map_err(|e| {
            error!(error = %e, "Failed to hash seed password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = match self.user_repository.find_user_by_email(email).await? {
            Some(mut existing) => {
                existing.password_hash = password_hash;
                existing.updated_at = Utc::now();
                existing
            }
            None => User::new(email.to_string(), password_hash),
        };
        self.user_repository.save_user(user.clone()).await?;

        info!(user_id = %user.id, "User account seeded");
        Ok(user)
    }

    /// Arms a reset token for the account and mails a link `<base_url>/reset/<token>`.
    #[instrument(skip(self), fields(email = email))]
    pub async fn forgot_password(&self, email: &str, base_url: &str) -> Result<()> {
        let mut user = self
            .user_repository
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| {
                warn!(email = email, "Password reset requested for unknown email");
                DomainError::Validation("No user found with that email address.".to_string())
            })?;

        let token = generate_reset_token();
        user.generate_password_reset(token.clone(), self.reset_token_ttl, Utc::now());
        self.user_repository.save_user(user.clone()).await?;

        let reset_url = format!("{}/reset/{}", base_url.trim_end_matches('/'), token);
        self.mailer
            .send(password_reset_mail(&user.email, &reset_url))
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Failed to send password reset email");
                e
            })?;

        info!(user_id = %user.id, "Password reset email sent");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<()> {
        let now = Utc::now();
        let mut user = self
            .user_repository
            .find_user_by_reset_token(token, now)
            .await?
            .ok_or_else(|| {
                warn!("Password reset attempted with invalid or expired token");
                DomainError::InvalidResetToken
            })?;

        if password.is_empty() {
            return Err(DomainError::Validation("Password is required".to_string()).into());
        }

        let password_hash = hash_password(password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;
        user.complete_password_reset(password_hash, now);
        self.user_repository.save_user(user.clone()).await?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}
