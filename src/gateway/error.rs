use thiserror::Error;

use crate::domain::{Currency, CustomerId, InvoiceId};

/// Classified failures raised by the payment provider.
///
/// A definitive decline is not an error: `charge` returns `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error(
        "Currency mismatch on invoice {invoice_id}: invoice is {invoice_currency}, customer {customer_id} is {customer_currency}"
    )]
    CurrencyMismatch {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
        invoice_currency: Currency,
        customer_currency: Currency,
    },

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),
}

impl PaymentError {
    /// Whether the same charge may succeed if attempted again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        assert!(PaymentError::Network("timeout".to_string()).is_transient());
        assert!(!PaymentError::CustomerNotFound(1).is_transient());
        assert!(
            !PaymentError::CurrencyMismatch {
                invoice_id: 1,
                customer_id: 1,
                invoice_currency: Currency::EUR,
                customer_currency: Currency::USD,
            }
            .is_transient()
        );
    }

    #[test]
    fn error_display_formats_correctly() {
        assert_eq!(
            PaymentError::CustomerNotFound(4).to_string(),
            "Customer not found: 4"
        );
        assert_eq!(
            PaymentError::CurrencyMismatch {
                invoice_id: 2,
                customer_id: 4,
                invoice_currency: Currency::EUR,
                customer_currency: Currency::DKK,
            }
            .to_string(),
            "Currency mismatch on invoice 2: invoice is EUR, customer 4 is DKK"
        );
    }
}
