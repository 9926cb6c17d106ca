use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::error::BillingError;
use super::report::{CustomerReport, InvoiceOutcome};
use super::retry::{RetryPolicy, charge_with_retry};
use crate::domain::{Customer, Invoice, InvoiceStatus};
use crate::events::{BillingEvent, EventKind, EventSink};
use crate::gateway::{PaymentError, PaymentProvider};
use crate::storage::BillingStore;

/// Charges the invoices of one customer and records every outcome
pub struct InvoiceProcessor<S, P, E, R> {
    store: Arc<S>,
    provider: Arc<P>,
    events: Arc<E>,
    retry: Arc<R>,
}

impl<S, P, E, R> Clone for InvoiceProcessor<S, P, E, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            provider: Arc::clone(&self.provider),
            events: Arc::clone(&self.events),
            retry: Arc::clone(&self.retry),
        }
    }
}

impl<S, P, E, R> InvoiceProcessor<S, P, E, R>
where
    S: BillingStore,
    P: PaymentProvider,
    E: EventSink,
    R: RetryPolicy,
{
    pub fn new(store: Arc<S>, provider: Arc<P>, events: Arc<E>, retry: Arc<R>) -> Self {
        Self {
            store,
            provider,
            events,
            retry,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn events(&self) -> &Arc<E> {
        &self.events
    }

    pub(crate) fn with_retry<R2: RetryPolicy>(self, retry: R2) -> InvoiceProcessor<S, P, E, R2> {
        InvoiceProcessor {
            store: self.store,
            provider: self.provider,
            events: self.events,
            retry: Arc::new(retry),
        }
    }

    pub(crate) fn emit(&self, event: BillingEvent) {
        self.events.notify(event);
    }

    /// Charge every pending invoice of a customer, ascending by id.
    ///
    /// Stops at the first invoice whose customer the provider cannot find.
    pub async fn process_customer(&self, customer: &Customer) -> CustomerReport {
        let invoices = match self
            .store
            .fetch_pending_invoices_by_customer_id(customer.id)
            .await
        {
            Ok(invoices) => invoices,
            Err(e) => {
                error!(customer_id = customer.id, error = %e, "Could not fetch pending invoices");
                self.emit(BillingEvent::customer(
                    EventKind::InvoiceLookupFailed,
                    customer.id,
                ));
                return CustomerReport::lookup_failed(customer.id);
            }
        };

        debug!(
            customer_id = customer.id,
            pending = invoices.len(),
            "Processing customer"
        );

        let mut report = CustomerReport::new(customer.id);
        for (index, invoice) in invoices.iter().enumerate() {
            let outcome = self.process_invoice(customer, invoice).await;
            report.outcomes.push((invoice.id, outcome));

            if outcome.abandons_customer() {
                debug!(
                    customer_id = customer.id,
                    skipped = invoices.len() - index - 1,
                    "Skipping remaining invoices of missing customer"
                );
                break;
            }
        }

        report
    }

    /// Charge one invoice with retries and settle its status
    pub async fn process_invoice(&self, customer: &Customer, invoice: &Invoice) -> InvoiceOutcome {
        match charge_with_retry(&*self.provider, invoice, &*self.retry).await {
            Ok(true) => match self.mark_paid(customer, invoice).await {
                Ok(()) => InvoiceOutcome::Charged,
                Err(_) => InvoiceOutcome::WriteFailed,
            },
            Ok(false) => {
                self.declined(customer, invoice);
                InvoiceOutcome::Declined
            }
            Err(e) => self.failed(customer, invoice, &e),
        }
    }

    /// Single charge attempt for an operator-triggered payment
    pub async fn process_single(
        &self,
        customer: &Customer,
        invoice: &Invoice,
    ) -> Result<bool, BillingError> {
        info!(
            customer_id = customer.id,
            invoice_id = invoice.id,
            "Manual invoice payment"
        );
        self.emit(BillingEvent::invoice(
            EventKind::ManualInvoiceUpdate,
            customer.id,
            invoice.id,
        ));

        match self.provider.charge(invoice).await {
            Ok(true) => {
                self.mark_paid(customer, invoice).await?;
                Ok(true)
            }
            Ok(false) => {
                self.declined(customer, invoice);
                Ok(false)
            }
            Err(e) => {
                self.failed(customer, invoice, &e);
                Err(e.into())
            }
        }
    }

    /// Record a successful charge and write the paid status
    async fn mark_paid(&self, customer: &Customer, invoice: &Invoice) -> Result<(), BillingError> {
        self.emit(BillingEvent::invoice(
            EventKind::InvoiceCharged,
            customer.id,
            invoice.id,
        ));

        match self
            .store
            .update_invoice_status(invoice.id, InvoiceStatus::Paid)
            .await
        {
            Ok(rows) if rows > 0 => {
                debug!(invoice_id = invoice.id, "Invoice marked as paid");
                self.emit(BillingEvent::invoice(
                    EventKind::InvoiceUpdated,
                    customer.id,
                    invoice.id,
                ));
                Ok(())
            }
            result => {
                match result {
                    Err(e) => error!(invoice_id = invoice.id, error = %e, "Invoice charged but status write failed"),
                    Ok(_) => error!(invoice_id = invoice.id, "Invoice charged but no row was updated"),
                }
                self.emit(BillingEvent::invoice(
                    EventKind::InvoiceNotUpdated,
                    customer.id,
                    invoice.id,
                ));
                Err(BillingError::InvoiceNotUpdated(invoice.id))
            }
        }
    }

    fn declined(&self, customer: &Customer, invoice: &Invoice) {
        info!(
            customer_id = customer.id,
            invoice_id = invoice.id,
            "Charge declined, insufficient funds"
        );
        self.emit(BillingEvent::invoice(
            EventKind::InsufficientFunds,
            customer.id,
            invoice.id,
        ));
    }

    fn failed(&self, customer: &Customer, invoice: &Invoice, error: &PaymentError) -> InvoiceOutcome {
        let (kind, outcome) = match error {
            PaymentError::CurrencyMismatch { .. } => {
                (EventKind::CurrencyMismatch, InvoiceOutcome::CurrencyMismatch)
            }
            PaymentError::CustomerNotFound(_) => {
                (EventKind::CustomerNotFound, InvoiceOutcome::CustomerNotFound)
            }
            PaymentError::Network(_) => (EventKind::ChargeFailed, InvoiceOutcome::Unresolved),
        };

        warn!(
            customer_id = customer.id,
            invoice_id = invoice.id,
            error = %error,
            "Invoice not charged"
        );
        self.emit(BillingEvent::invoice(kind, customer.id, invoice.id));
        outcome
    }
}
