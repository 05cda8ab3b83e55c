//! Storage-layer error type, convertible into the domain's `DomainError`.

use registration_domain::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => DomainError::NotFound(msg),
            StorageError::Conflict(msg) => DomainError::Conflict(msg),
            StorageError::Unavailable(msg) => DomainError::Unavailable(msg),
        }
    }
}
