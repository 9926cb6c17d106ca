pub mod concurrent;
pub mod error;
pub mod traits;

// Re-export commonly used types
pub use concurrent::ConcurrentBillingStore;
pub use error::StorageError;
pub use traits::{BillingStore, CustomerStore, InvoiceStore};
