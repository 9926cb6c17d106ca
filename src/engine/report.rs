use std::time::Duration;

use serde::Serialize;

use crate::domain::{CustomerId, InvoiceId};

/// Terminal state of one invoice within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceOutcome {
    /// Charged and marked as paid
    Charged,
    /// Provider refused the charge
    Declined,
    CurrencyMismatch,
    CustomerNotFound,
    /// Charged, but the paid status was not written
    WriteFailed,
    /// Transient failures outlasted the retry policy
    Unresolved,
}

impl InvoiceOutcome {
    /// The customer's remaining invoices are skipped after this outcome
    pub fn abandons_customer(&self) -> bool {
        matches!(self, Self::CustomerNotFound)
    }
}

/// What one customer worker did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerReport {
    pub customer_id: CustomerId,
    pub outcomes: Vec<(InvoiceId, InvoiceOutcome)>,
    /// Pending invoices could not be read
    pub lookup_failed: bool,
}

impl CustomerReport {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            outcomes: Vec::new(),
            lookup_failed: false,
        }
    }

    pub fn lookup_failed(customer_id: CustomerId) -> Self {
        Self {
            lookup_failed: true,
            ..Self::new(customer_id)
        }
    }
}

/// Counters for a completed billing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Customer pages fetched, including the terminating empty page
    pub pages: usize,
    pub customers: usize,
    pub invoices: usize,
    pub charged: usize,
    pub declined: usize,
    pub currency_mismatches: usize,
    pub customers_not_found: usize,
    pub write_failures: usize,
    pub unresolved: usize,
    pub lookup_failures: usize,
    pub worker_panics: usize,
    /// Set when paging stopped early on a storage error
    pub paging_error: Option<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    pub(crate) fn absorb(&mut self, report: CustomerReport) {
        if report.lookup_failed {
            self.lookup_failures += 1;
        }

        for (_, outcome) in report.outcomes {
            self.invoices += 1;
            match outcome {
                InvoiceOutcome::Charged => self.charged += 1,
                InvoiceOutcome::Declined => self.declined += 1,
                InvoiceOutcome::CurrencyMismatch => self.currency_mismatches += 1,
                InvoiceOutcome::CustomerNotFound => self.customers_not_found += 1,
                InvoiceOutcome::WriteFailed => self.write_failures += 1,
                InvoiceOutcome::Unresolved => self.unresolved += 1,
            }
        }
    }

    /// Every customer was reached and nothing needs operator attention
    pub fn is_clean(&self) -> bool {
        self.paging_error.is_none()
            && self.worker_panics == 0
            && self.lookup_failures == 0
            && self.currency_mismatches == 0
            && self.customers_not_found == 0
            && self.write_failures == 0
            && self.unresolved == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_counts_each_outcome() {
        let mut summary = RunSummary::default();

        let mut report = CustomerReport::new(1);
        report.outcomes.push((1, InvoiceOutcome::Charged));
        report.outcomes.push((2, InvoiceOutcome::Declined));
        report.outcomes.push((3, InvoiceOutcome::WriteFailed));
        summary.absorb(report);
        summary.absorb(CustomerReport::lookup_failed(2));

        assert_eq!(summary.invoices, 3);
        assert_eq!(summary.charged, 1);
        assert_eq!(summary.declined, 1);
        assert_eq!(summary.write_failures, 1);
        assert_eq!(summary.lookup_failures, 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn declines_keep_summary_clean() {
        let mut summary = RunSummary::default();
        let mut report = CustomerReport::new(1);
        report.outcomes.push((1, InvoiceOutcome::Declined));
        summary.absorb(report);

        assert!(summary.is_clean());
    }

    #[test]
    fn only_missing_customer_abandons_remaining_invoices() {
        assert!(InvoiceOutcome::CustomerNotFound.abandons_customer());
        assert!(!InvoiceOutcome::CurrencyMismatch.abandons_customer());
        assert!(!InvoiceOutcome::Unresolved.abandons_customer());
    }
}
