pub mod event;
pub mod sink;

// Re-export commonly used types
pub use event::{Audience, BillingEvent, EventKind};
pub use sink::{EventSink, QueuedEventSink, RecordingEventSink, TracingEventSink};
