use crate::domain::employee::{Employee, EmployeeForm};
use crate::domain::error::DomainError;
use crate::domain::repository::EmployeeRepository;
use crate::infrastructure::uploads::{ImageStore, UploadedImage, validate_image};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct EmployeeService<R: EmployeeRepository> {
    repository: Arc<R>,
    images: ImageStore,
}

impl<R: EmployeeRepository> EmployeeService<R> {
    pub fn new(repository: Arc<R>, images: ImageStore) -> Self {
        Self { repository, images }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    #[instrument(skip(self, form, image), fields(has_image = image.is_some()))]
    pub async fn create_employee(
        &self,
        form: EmployeeForm,
        image: Option<UploadedImage>,
    ) -> Result<Employee> {
        if let Some(image) = &image {
            validate_image(image)?;
        }
        let fields = form.into_fields()?;

        let profile_picture = self.store_image(image.as_ref()).await?;
        let employee = Employee::new(
            Uuid::new_v4().to_string(),
            fields,
            profile_picture.clone(),
            Utc::now(),
        );

        if let Err(e) = self.repository.insert(employee.clone()).await {
            self.discard_image(profile_picture.as_deref()).await;
            return Err(e);
        }

        info!(employee_id = %employee.id, email = %employee.email, "Employee created");
        Ok(employee)
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>> {
        self.repository.find_all().await
    }

    pub async fn get_employee(&self, id: &str) -> Result<Employee> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Employee not found".to_string()).into())
    }

    /// Replaces every field; the stored picture only changes when a new image is supplied.
    #[instrument(skip(self, form, image), fields(has_image = image.is_some()))]
    pub async fn update_employee(
        &self,
        id: &str,
        form: EmployeeForm,
        image: Option<UploadedImage>,
    ) -> Result<Employee> {
        if let Some(image) = &image {
            validate_image(image)?;
        }
        let mut employee = self.get_employee(id).await?;
        let fields = form.into_fields()?;

        let profile_picture = self.store_image(image.as_ref()).await?;
        let superseded = employee.apply(fields, profile_picture.clone(), Utc::now());

        if let Err(e) = self.repository.update(employee.clone()).await {
            self.discard_image(profile_picture.as_deref()).await;
            return Err(e);
        }
        if let Some(old) = superseded.filter(|old| Some(old) != profile_picture.as_ref()) {
            self.discard_image(Some(old.as_str())).await;
        }

        info!(employee_id = %employee.id, "Employee updated");
        Ok(employee)
    }

    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: &str) -> Result<()> {
        let employee = self.get_employee(id).await?;

        if let Some(path) = &employee.profile_picture {
            self.images.remove(path).await?;
        }
        self.repository.delete(&employee.id).await?;

        info!(employee_id = %employee.id, "Employee deleted");
        Ok(())
    }

    async fn store_image(&self, image: Option<&UploadedImage>) -> Result<Option<String>> {
        match image {
            Some(image) => Ok(Some(self.images.save(image).await?)),
            None => Ok(None),
        }
    }

    /// Best-effort cleanup of a file no record points at.
    async fn discard_image(&self, path: Option<&str>) {
        if let Some(path) = path {
            match self.images.remove(path).await {
                Ok(()) => debug!(path = path, "Discarded unreferenced image"),
                Err(e) => warn!(path = path, error = %e, "Failed to discard unreferenced image"),
            }
        }
    }
}
