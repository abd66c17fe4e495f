use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Password reset token is invalid or has expired.")]
    InvalidResetToken,
    #[error("Internal error: {0}")]
    Internal(String),
}
