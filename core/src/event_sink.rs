//! Event sink abstraction for workflow transitions.
//!
//! The engine emits one event per state transition. Where those events go is not
//! its concern: production wiring forwards them to `tracing`, tests record them in
//! memory, and other deployments may fan them out to a bus.
//!
//! ```text
//! ┌──────────────────┐   emit(&event)   ┌───────────────┐
//! │   Coordinator    │ ───────────────► │   EventSink   │
//! └──────────────────┘                  └───────┬───────┘
//!                                               │
//!                                 ┌─────────────┼──────────────┐
//!                                 ▼             ▼              ▼
//!                           TracingSink   RecordingSink   (your sink)
//! ```
//!
//! # Delivery
//!
//! - **Synchronous**: `emit` is called inline, after the transition is applied
//! - **Infallible**: a sink that cannot deliver must log and move on; the
//!   workflow outcome never depends on the sink
//! - **Ordered**: events for one claimant are emitted in transition order

use crate::event::Event;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Destination for transition events.
///
/// Implementations must be `Send + Sync`: the coordinator is shared between
/// concurrent request handlers and emits from whichever one applied the
/// transition.
pub trait EventSink<E: Event>: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: &E);
}

impl<E: Event, S: EventSink<E> + ?Sized> EventSink<E> for Arc<S> {
    fn emit(&self, event: &E) {
        (**self).emit(event);
    }
}

/// Sink that writes every event as a structured `tracing` record.
///
/// The record carries the event type and the JSON payload, so any subscriber
/// (fmt, JSON, OpenTelemetry) receives the full transition.
#[derive(Debug)]
pub struct TracingSink<E> {
    component: &'static str,
    _event: PhantomData<fn(&E)>,
}

impl<E> TracingSink<E> {
    /// Creates a sink that tags each record with `component`.
    #[must_use]
    pub const fn new(component: &'static str) -> Self {
        Self {
            component,
            _event: PhantomData,
        }
    }

    /// The component tag attached to every record.
    #[must_use]
    pub const fn component(&self) -> &'static str {
        self.component
    }
}

impl<E: Event + Serialize> EventSink<E> for TracingSink<E> {
    fn emit(&self, event: &E) {
        match event.to_json() {
            Ok(payload) => tracing::info!(
                component = self.component,
                event_type = event.event_type(),
                payload = %payload,
                "workflow transition"
            ),
            Err(error) => tracing::warn!(
                component = self.component,
                event_type = event.event_type(),
                error = %error,
                "workflow transition (payload unavailable)"
            ),
        }
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<E: Event> EventSink<E> for NullSink {
    fn emit(&self, _event: &E) {}
}
