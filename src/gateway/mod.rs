pub mod error;
pub mod provider;
pub mod scripted;
pub mod simulated;

// Re-export commonly used types
pub use error::PaymentError;
pub use provider::PaymentProvider;
pub use scripted::ScriptedPaymentProvider;
pub use simulated::SimulatedPaymentProvider;
