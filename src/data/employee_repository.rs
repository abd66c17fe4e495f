use crate::domain::employee::Employee;
use crate::domain::error::DomainError;
use crate::domain::repository::EmployeeRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

const DUPLICATE_EMAIL: &str = "An employee with this email already exists";

#[derive(Clone)]
pub struct InMemoryEmployeeRepository {
    storage: Arc<RwLock<HashMap<String, Employee>>>,
}

impl InMemoryEmployeeRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryEmployeeRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn email_taken(storage: &HashMap<String, Employee>, email: &str, except_id: &str) -> bool {
    storage
        .values()
        .any(|e| e.id != except_id && e.email == email)
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    #[instrument(skip(self, employee), fields(employee_id = %employee.id, email = %employee.email))]
    async fn insert(&self, employee: Employee) -> Result<()> {
        trace!("Acquiring write lock for employee storage");
        let mut storage = self.storage.write().await;
        if email_taken(&storage, &employee.email, &employee.id) {
            warn!(email = %employee.email, "Rejected insert with duplicate email");
            return Err(DomainError::Validation(DUPLICATE_EMAIL.to_string()).into());
        }
        debug!(employee_id = %employee.id, "Employee inserted into memory storage");
        storage.insert(employee.id.clone(), employee);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Employee>> {
        let storage = self.storage.read().await;
        let mut employees: Vec<Employee> = storage.values().cloned().collect();
        employees.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!(count = employees.len(), "Listed employees");
        Ok(employees)
    }

    #[instrument(skip(self), fields(employee_id = id))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>> {
        let storage = self.storage.read().await;
        let employee = storage.get(id).cloned();
        if employee.is_none() {
            trace!(employee_id = id, "Employee not found in storage");
        }
        Ok(employee)
    }

    #[instrument(skip(self, employee), fields(employee_id = %employee.id))]
    async fn update(&self, employee: Employee) -> Result<()> {
        let mut storage = self.storage.write().await;
        if !storage.contains_key(&employee.id) {
            return Err(DomainError::NotFound("Employee not found".to_string()).into());
        }
        if email_taken(&storage, &employee.email, &employee.id) {
            warn!(email = %employee.email, "Rejected update with duplicate email");
            return Err(DomainError::Validation(DUPLICATE_EMAIL.to_string()).into());
        }
        storage.insert(employee.id.clone(), employee);
        Ok(())
    }

    #[instrument(skip(self), fields(employee_id = id))]
    async fn delete(&self, id: &str) -> Result<Option<Employee>> {
        let mut storage = self.storage.write().await;
        let removed = storage.remove(id);
        if removed.is_some() {
            debug!(employee_id = id, "Employee removed from memory storage");
        }
        Ok(removed)
    }
}
