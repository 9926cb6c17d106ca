//! Recurring invoice billing.
//!
//! A billing run pages through every customer, charges each pending invoice
//! through a [`gateway::PaymentProvider`] and marks it paid. Failures are
//! classified, reported through [`events::EventSink`] and never abort the run.

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod events;
pub mod gateway;
pub mod io;
pub mod prelude;
pub mod scheduler;
pub mod storage;
