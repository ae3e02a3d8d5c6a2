//! # Ticket Queue Core
//!
//! Environment abstractions shared by the ticket queue engine and its test support.
//!
//! The engine keeps its business rules free of ambient dependencies. Everything
//! that touches the outside world is injected through the types in this crate:
//!
//! - **Clock**: the time source used for reservation expiry
//! - **Event**: a transition fact with a stable, versioned type name
//! - **`EventSink`**: where transition events are delivered (tracing, tests, ...)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ticket_queue_core::environment::{Clock, SystemClock};
//! use ticket_queue_core::event_sink::TracingSink;
//!
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let sink = Arc::new(TracingSink::new("ticket_queue"));
//! let coordinator = ReservationCoordinator::new(config, clock, sink);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod event;
pub mod event_sink;

/// Environment module - Dependency injection traits
///
/// All time-dependent behavior in the engine reads the current instant through
/// [`Clock`](environment::Clock) so expiry boundaries can be tested
/// deterministically.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// One clock instance must be shared by every component of a coordinator:
    /// holds are created and validated against the same time source.
    ///
    /// # Examples
    ///
    /// ```
    /// use ticket_queue_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time source used in production.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
