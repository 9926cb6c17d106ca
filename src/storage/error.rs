use thiserror::Error;

use crate::domain::{CustomerId, InvoiceId};

/// Storage-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        assert_eq!(
            StorageError::CustomerNotFound(3).to_string(),
            "Customer not found: 3"
        );
        assert_eq!(
            StorageError::InvoiceNotFound(9).to_string(),
            "Invoice not found: 9"
        );
        assert_eq!(
            StorageError::Unavailable("connection reset".to_string()).to_string(),
            "Storage unavailable: connection reset"
        );
    }
}
