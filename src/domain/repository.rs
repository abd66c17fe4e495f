use crate::domain::employee::Employee;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Fails with a validation error if another employee already uses the same email.
    async fn insert(&self, employee: Employee) -> Result<()>;
    /// All employees, oldest first.
    async fn find_all(&self) -> Result<Vec<Employee>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>>;
    /// Fails with not-found if the id is unknown, or a validation error on an email clash.
    async fn update(&self, employee: Employee) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<Option<Employee>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save_user(&self, user: User) -> Result<()>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;
}
