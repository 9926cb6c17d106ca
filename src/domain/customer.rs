use serde::Serialize;

use super::money::Currency;

pub type CustomerId = u32;

/// A billable customer. Ids are strictly increasing and start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub currency: Currency,
}

impl Customer {
    pub fn new(id: CustomerId, currency: Currency) -> Self {
        Self { id, currency }
    }
}
