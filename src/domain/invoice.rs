use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::customer::CustomerId;
use super::error::DomainError;
use super::money::Money;

pub type InvoiceId = u32;

/// Invoice lifecycle as persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    InProgress,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Paid => "PAID",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "PAID" => Ok(Self::Paid),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}

/// An invoice owned by a customer.
///
/// The amount carries its own currency, which may differ from the owning
/// customer's; charging such an invoice fails permanently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn new(id: InvoiceId, customer_id: CustomerId, amount: Money, status: InvoiceStatus) -> Self {
        Self {
            id,
            customer_id,
            amount,
            status,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InvoiceStatus::Pending
    }
}
