//! Error type for the JSON item store.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid construction argument, e.g. an empty document path.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Backing document missing, or no record with the requested id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Document content is not an array of objects carrying an `id`.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// A caller-supplied value could not be turned into a record.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// HTTP status a handler should answer with when this error reaches it.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            StoreError::Configuration(_) | StoreError::CorruptData(_) | StoreError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
