use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::error::IoError;
use crate::storage::InvoiceStore;

pub const INVOICE_SNAPSHOT_HEADER: [&str; 5] = ["id", "customer_id", "amount", "currency", "status"];

/// Write every invoice, ascending by id, as CSV
pub async fn write_invoice_snapshot<S, W>(store: &S, mut writer: W) -> Result<(), IoError>
where
    S: InvoiceStore + ?Sized,
    W: AsyncWrite + Unpin + Send,
{
    let invoices = store.fetch_invoices().await?;

    let mut csv = csv::Writer::from_writer(Vec::new());
    csv.write_record(INVOICE_SNAPSHOT_HEADER)?;
    for invoice in &invoices {
        csv.write_record([
            invoice.id.to_string(),
            invoice.customer_id.to_string(),
            invoice.amount.value.to_decimal_string(),
            invoice.amount.currency.code().to_string(),
            invoice.status.as_str().to_string(),
        ])?;
    }
    let bytes = csv.into_inner().map_err(|e| IoError::Io(e.into_error()))?;

    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
