use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::IoError;
use crate::domain::{Currency, Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus, Money};

/// A typed value built from one CSV row
pub trait CsvRecord: Sized + Send + 'static {
    type Raw: DeserializeOwned + Send + 'static;

    fn from_raw(raw: Self::Raw) -> Result<Self, IoError>;
}

/// Raw customer row: `id,currency`
#[derive(Debug, Deserialize)]
pub struct RawCustomerRecord {
    pub id: CustomerId,
    pub currency: String,
}

impl RawCustomerRecord {
    pub fn parse(self) -> Result<Customer, IoError> {
        let currency: Currency = self.currency.parse()?;
        Ok(Customer::new(self.id, currency))
    }
}

/// Raw invoice row: `id,customer_id,amount,currency[,status]`
#[derive(Debug, Deserialize)]
pub struct RawInvoiceRecord {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl RawInvoiceRecord {
    /// Parse into an invoice; a missing status means pending
    pub fn parse(self) -> Result<Invoice, IoError> {
        let amount_str = self
            .amount
            .ok_or_else(|| IoError::MissingField("amount".to_string()))?;
        let currency: Currency = self.currency.parse()?;
        let amount = match Money::parse(&amount_str, currency) {
            Ok(amount) if amount.value.raw() >= 0 => amount,
            _ => return Err(IoError::InvalidAmount(amount_str)),
        };

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => InvoiceStatus::Pending,
            Some(s) => s.parse()?,
        };

        Ok(Invoice::new(self.id, self.customer_id, amount, status))
    }
}

impl CsvRecord for Customer {
    type Raw = RawCustomerRecord;

    fn from_raw(raw: Self::Raw) -> Result<Self, IoError> {
        raw.parse()
    }
}

impl CsvRecord for Invoice {
    type Raw = RawInvoiceRecord;

    fn from_raw(raw: Self::Raw) -> Result<Self, IoError> {
        raw.parse()
    }
}
