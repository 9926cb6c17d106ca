use async_trait::async_trait;
use dashmap::DashSet;
use tracing::debug;

use super::error::PaymentError;
use super::provider::PaymentProvider;
use crate::domain::{Invoice, InvoiceId};
use crate::storage::CustomerStore;

/// Provider that charges against a customer store.
///
/// Raises customer-not-found and currency-mismatch from the stored data,
/// declines every `decline_every`-th invoice and fails the first attempt of
/// every `flaky_every`-th invoice with a network error.
pub struct SimulatedPaymentProvider<S: CustomerStore> {
    customers: S,
    decline_every: Option<u32>,
    flaky_every: Option<u32>,
    failed_once: DashSet<InvoiceId>,
}

impl<S: CustomerStore> SimulatedPaymentProvider<S> {
    /// Create a provider that charges every valid invoice
    pub fn new(customers: S) -> Self {
        Self {
            customers,
            decline_every: None,
            flaky_every: None,
            failed_once: DashSet::new(),
        }
    }

    /// Decline invoices whose id is a multiple of `n`
    pub fn with_decline_every(mut self, n: u32) -> Self {
        self.decline_every = Some(n.max(1));
        self
    }

    /// Fail the first attempt for invoices whose id is a multiple of `n`
    pub fn with_flaky_every(mut self, n: u32) -> Self {
        self.flaky_every = Some(n.max(1));
        self
    }
}

fn hits(id: InvoiceId, every: Option<u32>) -> bool {
    every.is_some_and(|n| id % n == 0)
}

#[async_trait]
impl<S: CustomerStore> PaymentProvider for SimulatedPaymentProvider<S> {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError> {
        let customer = self
            .customers
            .fetch_customer(invoice.customer_id)
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?
            .ok_or(PaymentError::CustomerNotFound(invoice.customer_id))?;

        if customer.currency != invoice.amount.currency {
            return Err(PaymentError::CurrencyMismatch {
                invoice_id: invoice.id,
                customer_id: customer.id,
                invoice_currency: invoice.amount.currency,
                customer_currency: customer.currency,
            });
        }

        if hits(invoice.id, self.flaky_every) && self.failed_once.insert(invoice.id) {
            debug!(invoice_id = invoice.id, "Simulating network failure");
            return Err(PaymentError::Network("simulated timeout".to_string()));
        }

        Ok(!hits(invoice.id, self.decline_every))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, FixedPoint, InvoiceStatus, Money};
    use crate::storage::ConcurrentBillingStore;
    use std::sync::Arc;

    fn setup() -> Arc<ConcurrentBillingStore> {
        let store = Arc::new(ConcurrentBillingStore::new());
        store.create_customer(Currency::EUR);
        store
    }

    fn invoice(store: &ConcurrentBillingStore, customer_id: u32, currency: Currency) -> Invoice {
        store.create_invoice(
            customer_id,
            Money::new(FixedPoint::from_raw(10_000), currency),
            InvoiceStatus::Pending,
        )
    }

    #[tokio::test]
    async fn charges_matching_invoice() {
        let store = setup();
        let provider = SimulatedPaymentProvider::new(store.clone());

        let inv = invoice(&store, 1, Currency::EUR);
        assert_eq!(provider.charge(&inv).await, Ok(true));
    }

    #[tokio::test]
    async fn unknown_customer_is_reported() {
        let store = setup();
        let provider = SimulatedPaymentProvider::new(store.clone());

        let inv = invoice(&store, 42, Currency::EUR);
        assert_eq!(
            provider.charge(&inv).await,
            Err(PaymentError::CustomerNotFound(42))
        );
    }

    #[tokio::test]
    async fn currency_mismatch_is_reported() {
        let store = setup();
        let provider = SimulatedPaymentProvider::new(store.clone());

        let inv = invoice(&store, 1, Currency::USD);
        assert!(matches!(
            provider.charge(&inv).await,
            Err(PaymentError::CurrencyMismatch {
                invoice_currency: Currency::USD,
                customer_currency: Currency::EUR,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn flaky_invoice_fails_only_once() {
        let store = setup();
        let provider = SimulatedPaymentProvider::new(store.clone()).with_flaky_every(1);

        let inv = invoice(&store, 1, Currency::EUR);
        assert!(matches!(provider.charge(&inv).await, Err(PaymentError::Network(_))));
        assert_eq!(provider.charge(&inv).await, Ok(true));
    }

    #[tokio::test]
    async fn declines_every_nth_invoice() {
        let store = setup();
        let provider = SimulatedPaymentProvider::new(store.clone()).with_decline_every(2);

        let first = invoice(&store, 1, Currency::EUR);
        let second = invoice(&store, 1, Currency::EUR);
        assert_eq!(provider.charge(&first).await, Ok(true));
        assert_eq!(provider.charge(&second).await, Ok(false));
    }
}
