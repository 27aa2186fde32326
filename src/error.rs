use crate::domain::validation::ValidationStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ValidationStatus,
        to: ValidationStatus,
    },
    #[error("rejection requires a non-empty comment")]
    MissingValidationComment,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("amount overflow during fee calculation")]
    AmountOverflow,
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
}

impl FeeError {
    /// Transient faults are retried by the job dispatcher; business-rule
    /// violations are surfaced to the caller and never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) | Self::Io(_) | Self::Serialization(_) => true,
            #[cfg(feature = "storage-rocksdb")]
            Self::Storage(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeeError>;
