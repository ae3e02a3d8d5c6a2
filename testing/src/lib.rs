//! # Ticket Queue Testing
//!
//! Testing utilities and helpers for the ticket queue engine.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - A `RecordingSink` capturing every emitted transition event
//! - proptest strategies for claimant names and join sequences
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ticket_queue_testing::{ManualClock, RecordingSink, test_clock};
//!
//! #[test]
//! fn hold_expires() {
//!     let clock = Arc::new(ManualClock::starting_at(test_clock().now()));
//!     let sink = Arc::new(RecordingSink::new());
//!     let coordinator = ReservationCoordinator::new(config, clock.clone(), sink.clone());
//!
//!     coordinator.request_admission(&claimant);
//!     clock.advance_secs(601);
//!
//!     assert_eq!(coordinator.check_and_finalize(&claimant, true), FinalizeOutcome::Expired);
//! }
//! ```

use chrono::{DateTime, Utc};
use ticket_queue_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use parking_lot::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_queue_testing::mocks::FixedClock;
    /// use ticket_queue_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test tells it to.
    ///
    /// Shared through an `Arc` between the test and the code under test, so the
    /// test can step over expiry boundaries without sleeping.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_queue_testing::mocks::ManualClock;
    /// use ticket_queue_core::environment::Clock;
    ///
    /// let clock = ManualClock::default();
    /// let start = clock.now();
    /// clock.advance_secs(2);
    /// assert_eq!((clock.now() - start).num_seconds(), 2);
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock frozen at `time`
        #[must_use]
        pub const fn starting_at(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward (or backward, for a negative duration)
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock();
            *time += by;
        }

        /// Move the clock forward by whole seconds
        pub fn advance_secs(&self, secs: i64) {
            self.advance(chrono::Duration::seconds(secs));
        }

        /// Jump to an absolute instant
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock() = time;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::starting_at(super::test_clock().now())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// In-memory event sinks.
pub mod sinks {
    use parking_lot::Mutex;
    use ticket_queue_core::event::Event;
    use ticket_queue_core::event_sink::EventSink;

    /// Sink that keeps every emitted event for later assertions.
    #[derive(Debug)]
    pub struct RecordingSink<E> {
        events: Mutex<Vec<E>>,
    }

    impl<E> RecordingSink<E> {
        /// Create an empty sink
        #[must_use]
        pub const fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        /// Number of events recorded so far
        #[must_use]
        pub fn len(&self) -> usize {
            self.events.lock().len()
        }

        /// Whether nothing has been recorded
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.events.lock().is_empty()
        }
    }

    impl<E: Clone> RecordingSink<E> {
        /// Snapshot of the recorded events, in emission order
        #[must_use]
        pub fn events(&self) -> Vec<E> {
            self.events.lock().clone()
        }
    }

    impl<E: Event> RecordingSink<E> {
        /// Event type identifiers, in emission order
        #[must_use]
        pub fn event_types(&self) -> Vec<&'static str> {
            self.events.lock().iter().map(Event::event_type).collect()
        }
    }

    impl<E> Default for RecordingSink<E> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E: Event + Clone> EventSink<E> for RecordingSink<E> {
        fn emit(&self, event: &E) {
            self.events.lock().push(event.clone());
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::collection::vec;
    use proptest::prelude::*;

    /// Claimant names: short, non-empty, no surrounding whitespace.
    pub fn claimant_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,7}"
    }

    /// A sequence of join requests drawn from a small pool of names, so the
    /// same claimant polls several times.
    pub fn join_sequence(max_len: usize) -> impl Strategy<Value = Vec<String>> {
        vec(claimant_name(), 1..6).prop_flat_map(move |names| {
            vec(proptest::sample::select(names), 1..=max_len.max(1))
        })
    }
}

/// Install a test-friendly tracing subscriber (idempotent).
///
/// Output goes through the libtest capture, so it only shows for failing tests
/// or with `--nocapture`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_queue=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use sinks::RecordingSink;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn manual_clock_advances_and_rewinds() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance_secs(90);
        assert_eq!((clock.now() - start).num_seconds(), 90);
        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
