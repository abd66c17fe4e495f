pub mod employee_repository;
pub mod user_repository;
