//! Error taxonomy for the admission and reservation workflow.
//!
//! Every failure here is a recoverable workflow outcome. Callers receive these
//! values inside typed outcomes (`AdmissionOutcome::Refused`, ...), never as
//! faults that abort a request handler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workflow failures reported to the presentation layer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowError {
    /// The ticket pool was exhausted at admission time.
    #[error("Tickets are sold out")]
    SoldOut,

    /// A hold already exists for this claimant.
    ///
    /// Correct sequencing never produces this; observing it means the
    /// coordinator's state table and the reservation store disagree.
    #[error("Claimant already holds an active reservation")]
    AlreadyReserved,

    /// The claimant's hold expired before payment completed.
    #[error("Reservation expired")]
    ReservationExpired,

    /// The payment collaborator declined the attempt.
    #[error("Payment declined")]
    PaymentDeclined,

    /// The claimant already completed a purchase in this run.
    #[error("Claimant already completed a purchase")]
    AlreadyCompleted,

    /// The hold's expiry does not fit the clock's range.
    #[error("Hold duration is out of range")]
    HoldOutOfRange,
}

impl WorkflowError {
    /// Whether the same claimant can still succeed without restarting the workflow.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PaymentDeclined)
    }

    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::SoldOut => "sold_out",
            Self::AlreadyReserved => "already_reserved",
            Self::ReservationExpired => "reservation_expired",
            Self::PaymentDeclined => "payment_declined",
            Self::AlreadyCompleted => "already_completed",
            Self::HoldOutOfRange => "hold_out_of_range",
        }
    }
}

/// Invalid claimant identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimantIdError {
    /// The name was empty after trimming whitespace.
    #[error("Claimant name must not be empty")]
    Empty,

    /// The name exceeded the maximum accepted length.
    #[error("Claimant name is too long ({len} characters, max {max})")]
    TooLong {
        /// Length of the rejected name, in characters
        len: usize,
        /// Maximum accepted length
        max: usize,
    },
}

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The ticket pool must hold at least one ticket.
    #[error("Ticket pool size must be greater than zero")]
    EmptyPool,

    /// Holds must last at least one second.
    #[error("Hold duration must be at least one second")]
    ZeroHoldDuration,

    /// Holds are capped so their expiry stays representable.
    #[error("Hold duration of {secs}s exceeds the maximum of {max}s")]
    HoldDurationTooLong {
        /// Rejected duration, in seconds
        secs: u64,
        /// Maximum accepted duration, in seconds
        max: u64,
    },

    /// Probabilities live in `[0, 1]`.
    #[error("Payment success rate must be within [0, 1], got {0}")]
    InvalidSuccessRate(f64),
}
