use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::{Audience, BillingEvent, EventKind};

/// Destination for billing outcomes.
///
/// Fire-and-forget: implementations must not block the caller on delivery
/// and never report failures back into billing.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: BillingEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn notify(&self, event: BillingEvent) {
        (**self).notify(event)
    }
}

/// Registers every event in the log and raises alerts for operators
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn notify(&self, event: BillingEvent) {
        info!(
            kind = %event.kind,
            customer_id = ?event.customer_id,
            invoice_id = ?event.invoice_id,
            "Registering event"
        );

        match event.kind.audience() {
            Audience::Operators => warn!(
                kind = %event.kind,
                customer_id = ?event.customer_id,
                invoice_id = ?event.invoice_id,
                "Sending alert"
            ),
            Audience::Customer => debug!(
                kind = %event.kind,
                customer_id = ?event.customer_id,
                invoice_id = ?event.invoice_id,
                "Sending notification to customer"
            ),
            Audience::Log => {}
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<BillingEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, in arrival order
    pub fn events(&self) -> Vec<BillingEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for RecordingEventSink {
    fn notify(&self, event: BillingEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Hands events to a background task so slow delivery never holds up billing
#[derive(Debug, Clone)]
pub struct QueuedEventSink {
    sender: mpsc::UnboundedSender<BillingEvent>,
}

impl QueuedEventSink {
    /// Spawn the delivery task on the current runtime.
    ///
    /// The task ends once every `QueuedEventSink` clone has been dropped and
    /// the queue is drained.
    pub fn spawn<S>(inner: S) -> (Self, JoinHandle<()>)
    where
        S: EventSink + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<BillingEvent>();

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                inner.notify(event);
            }
            debug!("Event queue drained");
        });

        (Self { sender }, handle)
    }
}

impl EventSink for QueuedEventSink {
    fn notify(&self, event: BillingEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!(kind = %e.0.kind, "Event queue closed, dropping event");
        }
    }
}
