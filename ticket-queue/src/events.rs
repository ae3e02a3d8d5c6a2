//! Transition events emitted by the coordinator.
//!
//! Exactly one event is emitted per state transition:
//!
//! ```text
//! NotQueued ──ClaimantQueued──► Waiting ──TicketReserved──► Reserved
//!     ▲                            │                           │
//!     └──────ClaimantEvicted───────┘          ┌────────────────┴───────────────┐
//!                                             ▼                                ▼
//!                                   PurchaseCompleted                 ReservationExpired
//!                                       (Completed)                        (Expired)
//!                                             │                                │
//!                                             └─────────ClaimantReset──────────┘
//! ```
//!
//! `PaymentDeclined` is informational: the claimant stays `Reserved`.

use crate::error::WorkflowError;
use crate::types::{ClaimantId, HoldId, TicketCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticket_queue_core::event::Event;

/// Why a waiting claimant lost its queue slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionReason {
    /// The pool ran out while the claimant was still waiting
    SoldOut,
    /// The claimant sat at the head without polling for too long
    Idle {
        /// Seconds since the claimant last polled
        idle_seconds: i64,
    },
    /// The head could not be given a hold
    HoldRejected(WorkflowError),
}

/// Workflow transition facts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// A claimant entered the queue
    ClaimantQueued {
        /// Who joined
        claimant: ClaimantId,
        /// Claimants ahead at join time
        ahead: usize,
        /// When
        at: DateTime<Utc>,
    },

    /// The head claimant took a ticket and started a hold
    TicketReserved {
        /// Who holds the ticket
        claimant: ClaimantId,
        /// The new hold
        hold_id: HoldId,
        /// When the hold lapses
        expires_at: DateTime<Utc>,
        /// Tickets left in the pool after this one
        tickets_left: u32,
        /// When
        at: DateTime<Utc>,
    },

    /// Payment succeeded within the hold window
    PurchaseCompleted {
        /// Who bought the ticket
        claimant: ClaimantId,
        /// The hold that was committed
        hold_id: HoldId,
        /// Code printed on the ticket
        ticket: TicketCode,
        /// When
        at: DateTime<Utc>,
    },

    /// The hold lapsed; the ticket stays consumed
    ReservationExpired {
        /// Whose hold lapsed
        claimant: ClaimantId,
        /// The lapsed hold
        hold_id: HoldId,
        /// When the lapse was observed
        at: DateTime<Utc>,
    },

    /// A waiting claimant was removed from the queue
    ClaimantEvicted {
        /// Who was removed
        claimant: ClaimantId,
        /// Why
        reason: EvictionReason,
        /// When
        at: DateTime<Utc>,
    },

    /// A finished claimant was cleared so it can start over
    ClaimantReset {
        /// Who was cleared
        claimant: ClaimantId,
        /// When
        at: DateTime<Utc>,
    },

    /// A payment attempt was declined while the hold was still valid
    PaymentDeclined {
        /// Who attempted to pay
        claimant: ClaimantId,
        /// The hold that is still active
        hold_id: HoldId,
        /// Seconds left to retry
        remaining_seconds: u64,
        /// When
        at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// The claimant this event is about
    #[must_use]
    pub const fn claimant(&self) -> &ClaimantId {
        match self {
            Self::ClaimantQueued { claimant, .. }
            | Self::TicketReserved { claimant, .. }
            | Self::PurchaseCompleted { claimant, .. }
            | Self::ReservationExpired { claimant, .. }
            | Self::ClaimantEvicted { claimant, .. }
            | Self::ClaimantReset { claimant, .. }
            | Self::PaymentDeclined { claimant, .. } => claimant,
        }
    }

    /// When the event happened
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        match self {
            Self::ClaimantQueued { at, .. }
            | Self::TicketReserved { at, .. }
            | Self::PurchaseCompleted { at, .. }
            | Self::ReservationExpired { at, .. }
            | Self::ClaimantEvicted { at, .. }
            | Self::ClaimantReset { at, .. }
            | Self::PaymentDeclined { at, .. } => *at,
        }
    }
}

impl Event for WorkflowEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::ClaimantQueued { .. } => "ClaimantQueued.v1",
            Self::TicketReserved { .. } => "TicketReserved.v1",
            Self::PurchaseCompleted { .. } => "PurchaseCompleted.v1",
            Self::ReservationExpired { .. } => "ReservationExpired.v1",
            Self::ClaimantEvicted { .. } => "ClaimantEvicted.v1",
            Self::ClaimantReset { .. } => "ClaimantReset.v1",
            Self::PaymentDeclined { .. } => "PaymentDeclined.v1",
        }
    }
}
