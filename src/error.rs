use crate::domain::booking::BookingAction;
use crate::domain::money::Money;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("GCash payments require a proof of payment")]
    MissingProof,
    #[error("Overpayment guard: {attempted} would exceed the allowed {limit}")]
    OverpaymentGuard { attempted: Money, limit: Money },
    #[error("Booking {0} cannot be reconsidered until its rejection is resolved")]
    NotResolved(String),
    #[error("Cannot {action} from state {from}")]
    InvalidTransition { action: BookingAction, from: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Money arithmetic would produce a negative result")]
    NegativeResult,
    #[error("Money arithmetic overflowed")]
    Overflow,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    /// Whether retrying the same call may succeed.
    ///
    /// Business-rule violations are deterministic and never retryable; only
    /// infrastructure failures are.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::IoError(_) | EngineError::InternalError(_) => true,
            #[cfg(feature = "storage-rocksdb")]
            EngineError::StorageError(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
