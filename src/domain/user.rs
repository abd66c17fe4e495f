use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2 hash in PHC string form
    #[serde(rename = "password")]
    pub password_hash: String,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Arms a password reset. Any earlier token is overwritten.
    pub fn generate_password_reset(&mut self, token: String, ttl: Duration, now: DateTime<Utc>) {
        self.reset_password_token = Some(token);
        self.reset_password_expires = Some(now + ttl);
        self.updated_at = now;
    }

    /// A token only matches while its expiry is strictly in the future.
    pub fn has_valid_reset_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_password_token, self.reset_password_expires) {
            (Some(stored), Some(expires)) => stored == token && expires > now,
            _ => false,
        }
    }

    pub fn complete_password_reset(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.reset_password_token = None;
        self.reset_password_expires = None;
        self.updated_at = now;
    }
}

/// Fields are optional so a missing value is answered like an empty one.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}
