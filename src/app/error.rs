use std::io;
use thiserror::Error;

use crate::engine::BillingError;
use crate::io::IoError;

/// Top-level application errors unifying all layer errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV IO error: {0}")]
    CsvIo(#[from] IoError),

    #[error("Billing error: {0}")]
    Billing(#[from] BillingError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
