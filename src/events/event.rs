use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CustomerId, InvoiceId};

/// What happened during billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    BillingStarted,
    BillingFinished,
    BillingAlreadyRunning,
    ManualInvoiceUpdate,
    InvoiceCharged,
    InvoiceUpdated,
    InvoiceNotUpdated,
    InsufficientFunds,
    CurrencyMismatch,
    CustomerNotFound,
    ChargeFailed,
    InvoiceLookupFailed,
    CustomerPageFailed,
}

/// Who an event should reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Recorded only
    Log,
    /// Operators must look at it
    Operators,
    /// The customer is told about it
    Customer,
}

impl EventKind {
    pub fn audience(&self) -> Audience {
        match self {
            Self::BillingAlreadyRunning
            | Self::CurrencyMismatch
            | Self::CustomerNotFound
            | Self::InvoiceNotUpdated
            | Self::ChargeFailed
            | Self::InvoiceLookupFailed
            | Self::CustomerPageFailed => Audience::Operators,
            Self::InvoiceCharged | Self::InsufficientFunds => Audience::Customer,
            Self::BillingStarted
            | Self::BillingFinished
            | Self::ManualInvoiceUpdate
            | Self::InvoiceUpdated => Audience::Log,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BillingStarted => "BILLING_STARTED",
            Self::BillingFinished => "BILLING_FINISHED",
            Self::BillingAlreadyRunning => "BILLING_ALREADY_RUNNING",
            Self::ManualInvoiceUpdate => "MANUAL_INVOICE_UPDATE",
            Self::InvoiceCharged => "INVOICE_CHARGED",
            Self::InvoiceUpdated => "INVOICE_UPDATED",
            Self::InvoiceNotUpdated => "INVOICE_NOT_UPDATED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::CurrencyMismatch => "CURRENCY_MISMATCH",
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::ChargeFailed => "CHARGE_FAILED",
            Self::InvoiceLookupFailed => "INVOICE_LOOKUP_FAILED",
            Self::CustomerPageFailed => "CUSTOMER_PAGE_FAILED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured billing outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingEvent {
    pub kind: EventKind,
    pub customer_id: Option<CustomerId>,
    pub invoice_id: Option<InvoiceId>,
    pub at: DateTime<Utc>,
}

impl BillingEvent {
    /// Run-level event with no customer or invoice attached
    pub fn run(kind: EventKind) -> Self {
        Self {
            kind,
            customer_id: None,
            invoice_id: None,
            at: Utc::now(),
        }
    }

    pub fn customer(kind: EventKind, customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::run(kind)
        }
    }

    pub fn invoice(kind: EventKind, customer_id: CustomerId, invoice_id: InvoiceId) -> Self {
        Self {
            customer_id: Some(customer_id),
            invoice_id: Some(invoice_id),
            ..Self::run(kind)
        }
    }
}
