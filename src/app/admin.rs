//! Operator actions: trigger a run, pay a single invoice.
//!
//! Responses carry an HTTP-style status code so a thin transport layer can
//! forward them as-is.

use serde::Serialize;
use tracing::error;

use crate::domain::InvoiceId;
use crate::engine::{BillingError, BillingOrchestrator, RetryPolicy};
use crate::events::EventSink;
use crate::gateway::{PaymentError, PaymentProvider};
use crate::storage::{BillingStore, StorageError};

/// Outcome of an operator action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminResponse {
    pub status: u16,
    pub message: &'static str,
}

impl AdminResponse {
    const fn new(status: u16, message: &'static str) -> Self {
        Self { status, message }
    }

    pub const LAUNCHED: Self = Self::new(200, "Billing process launched");
    pub const ALREADY_RUNNING: Self =
        Self::new(405, "The billing process is currently being executed");
    pub const INVOICE_CHARGED: Self = Self::new(200, "Invoice correctly charged");
    pub const INSUFFICIENT_FUNDS: Self =
        Self::new(200, "The invoice could not be charged: insufficient funds");
    pub const INVOICE_NOT_FOUND: Self = Self::new(404, "Invoice not found");
    pub const CUSTOMER_NOT_FOUND: Self = Self::new(
        404,
        "The customer owning the invoice was not found, please contact the administrators",
    );
    pub const CURRENCY_MISMATCH: Self = Self::new(
        422,
        "The invoice currency does not match the customer currency",
    );
    pub const PROVIDER_UNAVAILABLE: Self = Self::new(
        502,
        "The payment provider could not be reached, please try again later",
    );
    pub const INVOICE_NOT_UPDATED: Self = Self::new(
        500,
        "The invoice was charged but could not be updated, please contact the administrators",
    );
    pub const INTERNAL_ERROR: Self = Self::new(500, "Internal error");

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<&BillingError> for AdminResponse {
    fn from(error: &BillingError) -> Self {
        match error {
            BillingError::AlreadyRunning => Self::ALREADY_RUNNING,
            BillingError::Payment(PaymentError::Network(_)) => Self::PROVIDER_UNAVAILABLE,
            BillingError::Payment(PaymentError::CurrencyMismatch { .. }) => Self::CURRENCY_MISMATCH,
            BillingError::Payment(PaymentError::CustomerNotFound(_))
            | BillingError::Storage(StorageError::CustomerNotFound(_)) => Self::CUSTOMER_NOT_FOUND,
            BillingError::Storage(StorageError::InvoiceNotFound(_)) => Self::INVOICE_NOT_FOUND,
            BillingError::InvoiceNotUpdated(_) => Self::INVOICE_NOT_UPDATED,
            BillingError::Storage(_) | BillingError::RunAborted(_) => Self::INTERNAL_ERROR,
        }
    }
}

/// Operator entry points over one orchestrator
pub struct AdminService<S, P, E, R> {
    orchestrator: BillingOrchestrator<S, P, E, R>,
}

impl<S, P, E, R> AdminService<S, P, E, R>
where
    S: BillingStore + 'static,
    P: PaymentProvider + 'static,
    E: EventSink + 'static,
    R: RetryPolicy + 'static,
{
    pub fn new(orchestrator: BillingOrchestrator<S, P, E, R>) -> Self {
        Self { orchestrator }
    }

    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }

    /// Launch a billing run in the background
    pub fn execute_billing_run(&self) -> AdminResponse {
        match self.orchestrator.start_run() {
            Ok(_) => AdminResponse::LAUNCHED,
            Err(e) => AdminResponse::from(&e),
        }
    }

    /// Charge one invoice right away
    pub async fn pay_invoice(&self, invoice_id: InvoiceId) -> AdminResponse {
        match self.try_pay_invoice(invoice_id).await {
            Ok(true) => AdminResponse::INVOICE_CHARGED,
            Ok(false) => AdminResponse::INSUFFICIENT_FUNDS,
            Err(e) => {
                let response = AdminResponse::from(&e);
                if response.status >= 500 {
                    error!(invoice_id, error = %e, "Manual invoice payment failed");
                }
                response
            }
        }
    }

    async fn try_pay_invoice(&self, invoice_id: InvoiceId) -> Result<bool, BillingError> {
        if self.orchestrator.is_running() {
            return Err(BillingError::AlreadyRunning);
        }

        let store = self.orchestrator.store();
        let invoice = store
            .fetch_invoice(invoice_id)
            .await?
            .ok_or(StorageError::InvoiceNotFound(invoice_id))?;
        let customer = store
            .fetch_customer(invoice.customer_id)
            .await?
            .ok_or(StorageError::CustomerNotFound(invoice.customer_id))?;

        self.orchestrator
            .process_single_invoice(&customer, &invoice)
            .await
    }
}
