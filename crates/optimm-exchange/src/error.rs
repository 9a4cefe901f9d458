//! Exchange error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Book, position or order data could not be obtained.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The exchange refused an order or cancel.
    #[error("Execution rejected: {0}")]
    ExecutionRejected(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
