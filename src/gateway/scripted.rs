use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::PaymentError;
use super::provider::PaymentProvider;
use crate::domain::{Invoice, InvoiceId};

type ChargeResult = Result<bool, PaymentError>;

/// Provider replaying scripted outcomes per invoice, for tests and demos.
///
/// Each call pops the next scripted result for the invoice; once a script is
/// exhausted (or none was given) the default result is returned.
pub struct ScriptedPaymentProvider {
    default: ChargeResult,
    scripts: DashMap<InvoiceId, VecDeque<ChargeResult>>,
    attempts: DashMap<InvoiceId, u32>,
    total: AtomicUsize,
}

impl ScriptedPaymentProvider {
    pub fn new(default: ChargeResult) -> Self {
        Self {
            default,
            scripts: DashMap::new(),
            attempts: DashMap::new(),
            total: AtomicUsize::new(0),
        }
    }

    /// Provider that charges every invoice successfully
    pub fn always_charge() -> Self {
        Self::new(Ok(true))
    }

    /// Script the results returned for one invoice, in call order
    pub fn with_script<I>(self, invoice_id: InvoiceId, results: I) -> Self
    where
        I: IntoIterator<Item = ChargeResult>,
    {
        self.scripts.insert(invoice_id, results.into_iter().collect());
        self
    }

    /// Number of charge calls made for one invoice
    pub fn attempts(&self, invoice_id: InvoiceId) -> u32 {
        self.attempts.get(&invoice_id).map(|a| *a).unwrap_or(0)
    }

    /// Number of charge calls made in total
    pub fn total_attempts(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for ScriptedPaymentProvider {
    async fn charge(&self, invoice: &Invoice) -> ChargeResult {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.attempts.entry(invoice.id).or_insert(0) += 1;

        self.scripts
            .get_mut(&invoice.id)
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.default.clone())
    }
}
