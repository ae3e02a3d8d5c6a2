//! Event trait and related types for transition events.
//!
//! Events represent facts about workflow transitions that already happened and are
//! immutable. They carry a stable, versioned type name and serialize to JSON so
//! sinks can attach the full payload to structured log records.
//!
//! # Example
//!
//! ```
//! use ticket_queue_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum DoorEvent {
//!     Opened { door: String },
//!     Closed { door: String },
//! }
//!
//! impl Event for DoorEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             DoorEvent::Opened { .. } => "DoorOpened.v1",
//!             DoorEvent::Closed { .. } => "DoorClosed.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to JSON.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from JSON.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// A transition event that can be delivered to an [`EventSink`](crate::event_sink::EventSink).
///
/// # Event Naming Convention
///
/// The `event_type()` method should return a stable string identifier that includes
/// a version number, e.g. `"ClaimantQueued.v1"`.
///
/// # Thread Safety
///
/// Events must be `Send + Sync + 'static` so sinks can hand them across threads.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_json(&self) -> Result<String, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_string(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the payload does not describe
    /// this event type.
    fn from_json(payload: &str) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_str(payload).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum TestEvent {
        Created { id: String, value: i32 },
        Updated { id: String, new_value: i32 },
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Created { .. } => "TestEvent.Created.v1",
                TestEvent::Updated { .. } => "TestEvent.Updated.v1",
            }
        }
    }

    #[test]
    fn event_type_returns_correct_identifier() {
        let event = TestEvent::Updated {
            id: "test-1".to_string(),
            new_value: 7,
        };
        assert_eq!(event.event_type(), "TestEvent.Updated.v1");
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn json_payload_names_the_variant() {
        let event = TestEvent::Created {
            id: "test-1".to_string(),
            value: 42,
        };

        let json = event.to_json().expect("serialization should succeed");
        assert!(json.contains("Created"));
        assert_eq!(
            TestEvent::from_json(&json).expect("deserialization should succeed"),
            event
        );
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let result = TestEvent::from_json("{\"Deleted\":{}}");
        assert!(matches!(result, Err(EventError::DeserializationError(_))));
    }
}
