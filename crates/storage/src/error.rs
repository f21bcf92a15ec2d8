use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing file exists but cannot be read or parsed. Never returned for a missing file.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid roster data: {0}")]
    Roster(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::StoreUnavailable(_))
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        StorageError::StoreUnavailable(format!("{what} lock poisoned"))
    }
}
