use thiserror::Error;

/// Domain-level errors raised while building billing values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Unknown invoice status: {0}")]
    UnknownStatus(String),
}
