pub mod cursor;
pub mod error;
pub mod orchestrator;
pub mod processor;
pub mod report;
pub mod retry;
pub mod run_guard;

// Re-export commonly used types
pub use cursor::{CustomerPageFetcher, PageCursor};
pub use error::BillingError;
pub use orchestrator::{BillingOrchestrator, RunHandle};
pub use processor::InvoiceProcessor;
pub use report::{CustomerReport, InvoiceOutcome, RunSummary};
pub use retry::{
    ConstantBackoff, ExponentialBackoff, RetryDecision, RetryPolicy, charge_with_retry,
};
pub use run_guard::{RunGuard, RunPermit};
