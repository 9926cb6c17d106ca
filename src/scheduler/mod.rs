pub mod runner;
pub mod schedule;

// Re-export commonly used types
pub use runner::BillingScheduler;
pub use schedule::{Schedule, next_month_start};
