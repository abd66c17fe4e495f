pub mod employee_service;
pub mod password_service;
