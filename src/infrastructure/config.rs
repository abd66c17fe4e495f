use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_RESET_TOKEN_TTL_SECS: i64 = 3600;

/// Process configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    /// Base for links in outgoing mail. Falls back to the request's own scheme and host.
    pub public_url: Option<String>,
    pub mail: MailConfig,
    pub reset_token_ttl: Duration,
    /// Accounts provisioned at start-up, from `SEED_USERS`.
    pub seed_users: Vec<SeedUser>,
}

#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    /// Sender address, also used as the SMTP username
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An account to create at start-up. The password is hashed before it is stored.
#[derive(Clone, PartialEq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parses `email:password` pairs separated by commas. Passwords may contain `:`.
fn parse_seed_users(raw: &str) -> Result<Vec<SeedUser>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(i, entry)| {
            let (email, password) = entry
                .split_once(':')
                .map(|(e, p)| (e.trim(), p))
                .filter(|(e, p)| e.contains('@') && !p.is_empty())
                .ok_or_else(|| {
                    anyhow!("SEED_USERS entry {} must look like email:password", i + 1)
                })?;
            Ok(SeedUser {
                email: email.to_string(),
                password: password.to_string(),
            })
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} is not set", key));

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let ttl_secs = match get("RESET_TOKEN_TTL_SECS") {
            Some(raw) => raw.parse::<i64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                anyhow!(
                    "RESET_TOKEN_TTL_SECS must be a positive number of seconds, got {:?}",
                    raw
                )
            })?,
            None => DEFAULT_RESET_TOKEN_TTL_SECS,
        };

        let seed_users = match get("SEED_USERS") {
            Some(raw) => parse_seed_users(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            upload_dir: PathBuf::from(
                get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            ),
            public_url: get("PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string()),
            mail: MailConfig {
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                email: require("EMAIL")?,
                password: require("EMAIL_PASSWORD")?,
            },
            reset_token_ttl: Duration::seconds(ttl_secs),
            seed_users,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
