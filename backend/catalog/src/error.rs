use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Record not found")]
    NotFound,

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Malformed document: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}
