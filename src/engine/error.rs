use thiserror::Error;

use crate::domain::InvoiceId;
use crate::gateway::PaymentError;
use crate::storage::StorageError;

/// Errors surfaced by the billing orchestrator to its callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error("Billing process already running")]
    AlreadyRunning,

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invoice {0} was charged but not updated")]
    InvoiceNotUpdated(InvoiceId),

    #[error("Billing run aborted: {0}")]
    RunAborted(String),
}
