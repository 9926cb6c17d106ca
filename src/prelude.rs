//! Prelude module for convenient imports
//!
//! Import everything you need with: `use biller::prelude::*;`

// Domain types
pub use crate::domain::{
    Currency, Customer, CustomerId, DomainError, FixedPoint, Invoice, InvoiceId, InvoiceStatus,
    Money,
};

// Storage types
pub use crate::storage::{
    BillingStore, ConcurrentBillingStore, CustomerStore, InvoiceStore, StorageError,
};

// Gateway types
pub use crate::gateway::{
    PaymentError, PaymentProvider, ScriptedPaymentProvider, SimulatedPaymentProvider,
};

// Event types
pub use crate::events::{
    BillingEvent, EventKind, EventSink, QueuedEventSink, RecordingEventSink, TracingEventSink,
};

// Engine types
pub use crate::engine::{
    BillingError, BillingOrchestrator, ConstantBackoff, ExponentialBackoff, InvoiceOutcome,
    RetryDecision, RetryPolicy, RunHandle, RunSummary,
};

// Configuration and scheduling
pub use crate::config::{BillingConfig, RetryConfig, ScheduleConfig};
pub use crate::scheduler::{BillingScheduler, Schedule};

// IO types
pub use crate::io::{
    CustomerCsvStream, InvoiceCsvStream, IoError, SeedReport, load_store, seed_store,
    write_invoice_snapshot,
};

// App types
pub use crate::app::{AdminResponse, AdminService, AppError, CliApp, init_tracing};
