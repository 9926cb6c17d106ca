use std::sync::Arc;

use async_trait::async_trait;

use super::error::PaymentError;
use crate::domain::Invoice;

/// External payment provider
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charge the invoice amount to its customer.
    ///
    /// Returns `Ok(true)` when the charge went through and `Ok(false)` on a
    /// definitive decline (e.g. insufficient funds). May be invoked more than
    /// once for the same invoice when transient failures are retried.
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError>;
}

#[async_trait]
impl<T: PaymentProvider + ?Sized> PaymentProvider for Arc<T> {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError> {
        (**self).charge(invoice).await
    }
}
