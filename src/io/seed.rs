use std::path::Path;

use futures::{Stream, StreamExt};
use tracing::{info, warn};

use super::csv_reader::{CustomerCsvStream, InvoiceCsvStream};
use super::error::IoError;
use crate::domain::{Customer, Invoice};
use crate::storage::ConcurrentBillingStore;

/// Rows loaded into a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub customers: usize,
    pub invoices: usize,
    /// Rows that failed to parse and were left out
    pub skipped: usize,
}

/// Insert streamed customers and invoices, skipping rows that fail to parse
pub async fn seed_store<C, I>(store: &ConcurrentBillingStore, customers: C, invoices: I) -> SeedReport
where
    C: Stream<Item = Result<Customer, IoError>>,
    I: Stream<Item = Result<Invoice, IoError>>,
{
    let mut report = SeedReport::default();

    let mut customers = std::pin::pin!(customers);
    while let Some(row) = customers.next().await {
        match row {
            Ok(customer) => {
                store.insert_customer(customer);
                report.customers += 1;
            }
            Err(e) => {
                warn!(error = %e, "Skipping customer row");
                report.skipped += 1;
            }
        }
    }

    let mut invoices = std::pin::pin!(invoices);
    while let Some(row) = invoices.next().await {
        match row {
            Ok(invoice) => {
                store.insert_invoice(invoice);
                report.invoices += 1;
            }
            Err(e) => {
                warn!(error = %e, "Skipping invoice row");
                report.skipped += 1;
            }
        }
    }

    report
}

/// Build a store from customer and invoice CSV files
pub async fn load_store(
    customers: impl AsRef<Path>,
    invoices: impl AsRef<Path>,
) -> Result<(ConcurrentBillingStore, SeedReport), IoError> {
    let customer_rows = CustomerCsvStream::from_file(customers).await?;
    let invoice_rows = InvoiceCsvStream::from_file(invoices).await?;

    let store = ConcurrentBillingStore::new();
    let report = seed_store(&store, customer_rows, invoice_rows).await;
    info!(
        customers = report.customers,
        invoices = report.invoices,
        skipped = report.skipped,
        "Seed data loaded"
    );

    Ok((store, report))
}
