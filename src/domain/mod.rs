pub mod customer;
pub mod error;
pub mod invoice;
pub mod money;

// Re-export commonly used types
pub use customer::{Customer, CustomerId};
pub use error::DomainError;
pub use invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use money::{Currency, FixedPoint, Money};
