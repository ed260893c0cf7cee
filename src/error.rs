use thiserror::Error;

/// Failure taxonomy for the record engines.
///
/// `Validation` covers caller mistakes caught before any write (blank or
/// duplicate session names, empty source cohorts) and is always fully
/// recoverable. `DataIntegrity` marks a malformed stored record; callers
/// degrade the affected student to zero-valued output instead of aborting a
/// batch. `Transaction` wraps a storage failure during an atomic write; the
/// source data is untouched because all writes are staged beforehand.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    DataIntegrity(String),
    #[error("transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_failed",
            CoreError::DataIntegrity(_) => "data_integrity",
            CoreError::Transaction(_) => "db_tx_failed",
        }
    }
}
