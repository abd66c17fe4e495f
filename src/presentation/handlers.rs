use crate::application::employee_service::EmployeeService;
use crate::application::password_service::PasswordService;
use crate::data::employee_repository::InMemoryEmployeeRepository;
use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::employee::Employee;
use crate::domain::error::DomainError;
use crate::presentation::multipart::{EmployeeSubmission, read_employee_form};
use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, web};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Dependencies shared by every handler, built once at start-up.
pub struct AppState {
    pub employee_service: EmployeeService<InMemoryEmployeeRepository>,
    pub password_service: PasswordService<InMemoryUserRepository>,
    /// Base URL for links in outgoing mail; the request host is used when unset.
    pub public_url: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

#[derive(Serialize)]
pub struct EmployeeUpdatedResponse {
    pub msg: String,
    pub employee: Employee,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::Validation(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        // internal detail stays in the log
        let body = match self {
            ApiError::Validation(msg) | ApiError::NotFound(msg) => {
                warn!(error = %error_msg, status = %status, "Request rejected");
                MessageResponse::new(msg.clone())
            }
            ApiError::Internal(_) => {
                error!(error = %error_msg, status = %status, "Internal error");
                MessageResponse::new(SERVER_ERROR_MESSAGE)
            }
        };

        HttpResponse::build(status).json(body)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => ApiError::Validation(msg.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::InvalidResetToken) => {
                ApiError::Validation(DomainError::InvalidResetToken.to_string())
            }
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_employee(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let EmployeeSubmission { form, image } = read_employee_form(payload).await?;
    let employee = state
        .employee_service
        .create_employee(form, image)
        .await?;
    info!(employee_id = %employee.id, "Create employee request completed");
    Ok(HttpResponse::Created().json(MessageResponse::new("Employee created successfully")))
}

#[instrument(skip(state))]
pub async fn get_employees(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let employees = state.employee_service.list_employees().await?;
    debug!(count = employees.len(), "Returning employees");
    Ok(HttpResponse::Ok().json(employees))
}

#[instrument(skip(state), fields(employee_id = %*path))]
pub async fn get_employee_by_id(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let employee = state.employee_service.get_employee(&path).await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[instrument(skip(state, payload), fields(employee_id = %*path))]
pub async fn update_employee(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let EmployeeSubmission { form, image } = read_employee_form(payload).await?;
    let employee = state
        .employee_service
        .update_employee(&path, form, image)
        .await?;
    Ok(HttpResponse::Ok().json(EmployeeUpdatedResponse {
        msg: "Employee updated successfully".to_string(),
        employee,
    }))
}

#[instrument(skip(state), fields(employee_id = %*path))]
pub async fn delete_employee(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.employee_service.delete_employee(&path).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Employee deleted successfully")))
}

/// Serves a stored profile picture from the upload directory.
#[instrument(skip(state), fields(filename = %*path))]
pub async fn serve_upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("File not found".to_string());
    let file = state
        .employee_service
        .images()
        .resolve(&path)
        .ok_or_else(not_found)?;

    let data = match tokio::fs::read(&file).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(ApiError::Internal(format!("Failed to read upload: {}", e))),
    };

    let extension = Path::new(&file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    let content_type = match extension.as_deref() {
        Some("png") => ContentType::png(),
        Some("jpg") | Some("jpeg") => ContentType::jpeg(),
        _ => ContentType::octet_stream(),
    };

    Ok(HttpResponse::Ok().content_type(content_type).body(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (DomainError::InvalidResetToken, StatusCode::BAD_REQUEST),
            (
                DomainError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (domain, expected) in cases {
            let api = ApiError::from(anyhow::Error::from(domain));
            assert_eq!(api.status_code(), expected);
        }
    }

    #[test]
    fn test_foreign_errors_are_internal() {
        let io = std::io::Error::new(ErrorKind::PermissionDenied, "denied");
        let api = ApiError::from(anyhow::Error::from(io));
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_internal_error_body_is_generic() {
        let api = ApiError::Internal("database exploded at row 7".to_string());
        let response = api.error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["msg"], "Server error");
    }
}
