use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn save_user(&self, user: User) -> Result<()> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        debug!(user_id = %user.id, "User saved to memory storage");
        storage.insert(user.id.clone(), user);
        Ok(())
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.values().find(|u| u.email == email).cloned();
        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in storage"),
            None => trace!(email = email, "User not found in storage"),
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).cloned())
    }

    #[instrument(skip(self, token))]
    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage
            .values()
            .find(|u| u.has_valid_reset_token(token, now))
            .cloned();
        match &user {
            Some(u) => debug!(user_id = %u.id, "Reset token matched"),
            None => trace!("No user holds an unexpired matching reset token"),
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: &str, email: &str) -> User {
        let mut user = User::new(email.to_string(), format!("hash-{}", id));
        user.id = id.to_string();
        user
    }

    #[tokio::test]
    async fn test_save_user_saves_user_correctly() {
        let repo = InMemoryUserRepository::new();
        let user = user("user-1", "test@example.com");

        repo.save_user(user.clone()).await.unwrap();

        let retrieved = repo.find_user_by_id("user-1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.email, user.email);
        assert_eq!(retrieved.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_find_user_by_email_finds_user_by_email() {
        let repo = InMemoryUserRepository::new();
        repo.save_user(user("user-2", "alice@example.com"))
            .await
            .unwrap();

        let found = repo
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "user-2");
    }

    #[tokio::test]
    async fn test_find_user_by_email_returns_none_for_nonexistent_email() {
        let repo = InMemoryUserRepository::new();

        let found = repo
            .find_user_by_email("nonexistent@example.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_save_user_overwrites_existing_user() {
        let repo = InMemoryUserRepository::new();
        let mut updated = user("user-4", "first@example.com");
        repo.save_user(updated.clone()).await.unwrap();

        updated.password_hash = "hash2".to_string();
        repo.save_user(updated).await.unwrap();

        let retrieved = repo.find_user_by_id("user-4").await.unwrap().unwrap();
        assert_eq!(retrieved.password_hash, "hash2");
    }

    #[tokio::test]
    async fn test_find_user_by_reset_token_honours_expiry() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let mut holder = user("user-5", "reset@example.com");
        holder.generate_password_reset("token-abc".to_string(), Duration::hours(1), now);
        repo.save_user(holder).await.unwrap();
        repo.save_user(user("user-6", "other@example.com"))
            .await
            .unwrap();

        let found = repo
            .find_user_by_reset_token("token-abc", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "user-5");

        let expired = repo
            .find_user_by_reset_token("token-abc", now + Duration::hours(2))
            .await
            .unwrap();
        assert!(expired.is_none());

        let unknown = repo
            .find_user_by_reset_token("token-xyz", now)
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writes() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo_clone = repo.clone();
                let user = user(&format!("user-{}", i), &format!("user{}@example.com", i));
                tokio::spawn(async move { repo_clone.save_user(user).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        for i in 0..10 {
            let found = repo.find_user_by_id(&format!("user-{}", i)).await.unwrap();
            assert_eq!(found.unwrap().email, format!("user{}@example.com", i));
        }
    }
}
