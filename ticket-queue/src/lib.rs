//! Ticket Queue - fair queue admission with time-bounded reservations
//!
//! A fixed pool of tickets is handed out in strict arrival order. The claimant at
//! the head of the queue takes a ticket and holds it for a limited time; paying
//! inside that window completes the purchase, letting it lapse expires the
//! claimant.
//!
//! # Architecture
//!
//! ```text
//!                     ┌──────────────────────────────┐
//!   request_admission │                              │ EventSink
//!  ──────────────────►│    ReservationCoordinator    │──────────► WorkflowEvent
//!  check_and_finalize │  (claimant table, one lock)  │
//!  ──────────────────►│                              │
//!                     └──────────────────────────────┘
//!                        │            │            │
//!                        ▼            ▼            ▼
//!                  ┌──────────┐ ┌───────────┐ ┌──────────────────┐
//!                  │TicketPool│ │ Fairness  │ │ ReservationStore │
//!                  │ (atomic) │ │   Queue   │ │  (lazy expiry)   │
//!                  └──────────┘ └───────────┘ └──────────────────┘
//! ```
//!
//! # Key Properties
//!
//! ## 1. No Overselling
//!
//! The pool decrements with a compare-and-swap loop, so concurrent consumers can
//! never take more tickets than the pool started with.
//!
//! ## 2. Strict FIFO
//!
//! Only the head of the queue may take a ticket. Everyone else is told how many
//! claimants are ahead and polls again.
//!
//! ## 3. Lazy Expiry
//!
//! Holds carry an absolute expiry and are checked whenever someone looks at them.
//! A lapsed hold is never completed, and its ticket is not returned to the pool.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticket_queue::{
//!     AdmissionOutcome, ClaimantId, ReservationCoordinator, WorkflowConfig, WorkflowEvent,
//! };
//! use ticket_queue_core::environment::SystemClock;
//! use ticket_queue_core::event_sink::TracingSink;
//!
//! let coordinator = ReservationCoordinator::new(
//!     WorkflowConfig::default(),
//!     Arc::new(SystemClock),
//!     Arc::new(TracingSink::<WorkflowEvent>::new("ticket_queue")),
//! );
//! let ana = ClaimantId::new("Ana").unwrap();
//! if let AdmissionOutcome::ReservedFor(seconds) = coordinator.request_admission(&ana) {
//!     println!("holding a ticket for {seconds}s");
//!     coordinator.check_and_finalize(&ana, true);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod metrics;
pub mod payment;
pub mod pool;
pub mod queue;
pub mod reservation;
pub mod types;

pub use config::{Config, WorkflowConfig};
pub use coordinator::{AdmissionOutcome, FinalizeOutcome, ReservationCoordinator};
pub use error::{ClaimantIdError, ConfigError, WorkflowError};
pub use events::{EvictionReason, WorkflowEvent};
pub use payment::{FixedPayments, PaymentSimulator, RandomPayments};
pub use pool::TicketPool;
pub use queue::FairnessQueue;
pub use reservation::ReservationStore;
pub use types::*;
