//! Reservation coordinator: queue admission, holds, and finalization.
//!
//! The coordinator owns the ticket pool, the fairness queue, and the reservation
//! store, and drives one state machine per claimant:
//!
//! ```text
//! NotQueued ──join──► Waiting ──head + ticket──► Reserved ──paid in time──► Completed
//!                        │                          │
//!                        │ sold out / idle head /    └──hold lapsed──► Expired
//!                        │ hold refused
//!                        ▼
//!                    NotQueued
//! ```
//!
//! # Concurrency
//!
//! One coordinator is built per process and shared (`Arc`) between request
//! handlers. Every public operation takes the claimant-table lock for its whole
//! duration, so compound transitions (join → hold → consume) are atomic with
//! respect to each other. The pool is lock-free; queue and store each guard their
//! own data. Lock order is always claimant table first, and the queue and store
//! locks are never held together.
//!
//! No operation blocks waiting for a turn. A claimant that is not at the head
//! polls [`ReservationCoordinator::request_admission`] again.
//!
//! Events are emitted while the claimant-table lock is held; a sink must not call
//! back into the coordinator.

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::events::{EvictionReason, WorkflowEvent};
use crate::metrics;
use crate::pool::TicketPool;
use crate::queue::FairnessQueue;
use crate::reservation::ReservationStore;
use crate::types::{ClaimantId, ClaimantState, ClaimantStatus, Hold, HoldId, TicketCode};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use ticket_queue_core::environment::Clock;
use ticket_queue_core::event_sink::EventSink;

type ClaimantTable = HashMap<ClaimantId, ClaimantState>;

/// Result of an admission request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionOutcome {
    /// Not admitted; see the reason
    Refused(WorkflowError),
    /// Queued; poll again later
    Waiting {
        /// Claimants ahead in the queue
        ahead: usize,
    },
    /// Holding a ticket for this many seconds
    ReservedFor(u64),
}

impl AdmissionOutcome {
    /// Stable label used in logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Refused(_) => "refused",
            Self::Waiting { .. } => "waiting",
            Self::ReservedFor(_) => "reserved",
        }
    }
}

/// Result of a payment check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizeOutcome {
    /// The purchase went through
    Completed(TicketCode),
    /// The hold lapsed before payment; the workflow must restart
    Expired,
    /// The claimant does not hold a ticket yet
    StillWaiting,
    /// Payment declined; the hold is still active
    Declined {
        /// Seconds left to retry
        remaining_seconds: u64,
    },
}

impl FinalizeOutcome {
    /// The workflow error behind an unfinished purchase, if any
    #[must_use]
    pub const fn error(&self) -> Option<WorkflowError> {
        match self {
            Self::Expired => Some(WorkflowError::ReservationExpired),
            Self::Declined { .. } => Some(WorkflowError::PaymentDeclined),
            Self::Completed(_) | Self::StillWaiting => None,
        }
    }
}

/// Drives the per-claimant admission and reservation workflow
pub struct ReservationCoordinator {
    config: WorkflowConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink<WorkflowEvent>>,
    pool: TicketPool,
    queue: FairnessQueue,
    reservations: ReservationStore,
    claimants: Mutex<ClaimantTable>,
}

impl ReservationCoordinator {
    /// Creates a coordinator with a full pool and an empty queue
    #[must_use]
    pub fn new(
        config: WorkflowConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink<WorkflowEvent>>,
    ) -> Self {
        Self {
            pool: TicketPool::new(config.pool_size),
            queue: FairnessQueue::new(),
            reservations: ReservationStore::new(Arc::clone(&clock)),
            claimants: Mutex::new(HashMap::new()),
            config,
            clock,
            sink,
        }
    }

    /// Asks for a ticket on behalf of `claimant`.
    ///
    /// Refuses outright when the pool is empty. Otherwise queues the claimant
    /// (idempotently) and, if it is their turn, takes a ticket and starts a hold.
    /// A claimant already holding a ticket gets the seconds left on the hold.
    pub fn request_admission(&self, claimant: &ClaimantId) -> AdmissionOutcome {
        let mut claimants = self.claimants.lock();
        let now = self.clock.now();
        self.sweep_head(&mut claimants, Some(claimant), now);

        let outcome = match state_of(&claimants, claimant) {
            ClaimantState::Completed(_) => {
                AdmissionOutcome::Refused(WorkflowError::AlreadyCompleted)
            }
            ClaimantState::Expired => AdmissionOutcome::Refused(WorkflowError::ReservationExpired),
            ClaimantState::Reserved(hold_id) => {
                self.recheck_hold(&mut claimants, claimant, hold_id, now)
            }
            ClaimantState::NotQueued => self.admit(&mut claimants, claimant, false, now),
            ClaimantState::Waiting => self.admit(&mut claimants, claimant, true, now),
        };

        if let AdmissionOutcome::Refused(reason) = &outcome {
            tracing::info!(claimant = %claimant, reason = reason.as_label(), "Admission refused");
        }
        metrics::record_admission(outcome.label());
        metrics::record_levels(self.pool.available(), self.queue.len());
        outcome
    }

    /// Applies a payment outcome to `claimant`'s hold.
    ///
    /// The hold is checked first: a lapsed hold expires the claimant regardless of
    /// the payment signal. A declined payment leaves the hold in place.
    pub fn check_and_finalize(
        &self,
        claimant: &ClaimantId,
        payment_succeeded: bool,
    ) -> FinalizeOutcome {
        let mut claimants = self.claimants.lock();
        let now = self.clock.now();

        let outcome = match state_of(&claimants, claimant) {
            ClaimantState::NotQueued | ClaimantState::Waiting => FinalizeOutcome::StillWaiting,
            ClaimantState::Completed(ticket) => FinalizeOutcome::Completed(ticket),
            ClaimantState::Expired => FinalizeOutcome::Expired,
            ClaimantState::Reserved(hold_id) => {
                if !self.reservations.is_valid(claimant) {
                    self.expire(&mut claimants, claimant, hold_id, now);
                    FinalizeOutcome::Expired
                } else if payment_succeeded {
                    FinalizeOutcome::Completed(self.complete(&mut claimants, claimant, hold_id, now))
                } else {
                    self.decline(claimant, hold_id, now)
                }
            }
        };

        metrics::record_levels(self.pool.available(), self.queue.len());
        outcome
    }

    /// Current state of `claimant`, for re-rendering.
    ///
    /// A reserved claimant whose hold has lapsed is expired by this call.
    pub fn status(&self, claimant: &ClaimantId) -> ClaimantStatus {
        let mut claimants = self.claimants.lock();
        let now = self.clock.now();

        match state_of(&claimants, claimant) {
            ClaimantState::NotQueued => ClaimantStatus::NotQueued,
            ClaimantState::Waiting => ClaimantStatus::Waiting {
                ahead: self.queue.position(claimant).unwrap_or(0),
            },
            ClaimantState::Reserved(hold_id) => {
                if let Some(hold) = self.reservations.get(claimant) {
                    ClaimantStatus::Reserved {
                        expires_at: hold.expires_at.inner(),
                        remaining_seconds: hold.remaining_secs(now),
                    }
                } else {
                    self.expire(&mut claimants, claimant, hold_id, now);
                    ClaimantStatus::Expired
                }
            }
            ClaimantState::Completed(ticket) => ClaimantStatus::Completed { ticket },
            ClaimantState::Expired => ClaimantStatus::Expired,
        }
    }

    /// Clears a finished claimant so the same name can start over.
    ///
    /// Returns `false` (and changes nothing) while the claimant is waiting or
    /// holding a ticket.
    pub fn reset(&self, claimant: &ClaimantId) -> bool {
        let mut claimants = self.claimants.lock();

        let state = state_of(&claimants, claimant);
        if state.is_active() {
            return false;
        }

        if state.is_terminal() {
            claimants.remove(claimant);
            tracing::info!(claimant = %claimant, "Claimant reset");
            self.sink.emit(&WorkflowEvent::ClaimantReset {
                claimant: claimant.clone(),
                at: self.clock.now(),
            });
        }
        true
    }

    /// Expires a lapsed head hold and, if configured, evicts an idle waiting head.
    ///
    /// Admission requests run this automatically; hosts may also call it on a
    /// timer. Returns the number of claimants released.
    pub fn sweep(&self) -> usize {
        let mut claimants = self.claimants.lock();
        let now = self.clock.now();
        let released = self.sweep_head(&mut claimants, None, now);
        metrics::record_levels(self.pool.available(), self.queue.len());
        released
    }

    /// Tickets still available in the pool
    #[must_use]
    pub fn available_tickets(&self) -> u32 {
        self.pool.available()
    }

    /// Tickets the pool started with
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    /// Claimants currently queued
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queued claimants, head first
    #[must_use]
    pub fn queue_snapshot(&self) -> Vec<ClaimantId> {
        self.queue.snapshot()
    }

    /// Holds that have not lapsed
    #[must_use]
    pub fn active_holds(&self) -> usize {
        self.reservations.active_count()
    }

    /// The rules this coordinator enforces
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Transitions (called with the claimant table locked)
    // ------------------------------------------------------------------------

    fn admit(
        &self,
        claimants: &mut ClaimantTable,
        claimant: &ClaimantId,
        already_waiting: bool,
        now: DateTime<Utc>,
    ) -> AdmissionOutcome {
        if self.is_sold_out() {
            if already_waiting {
                self.evict(claimants, claimant, EvictionReason::SoldOut, now);
            }
            return AdmissionOutcome::Refused(WorkflowError::SoldOut);
        }

        let at_head = self.queue.join(claimant, now);
        let ahead = self.queue.position(claimant).unwrap_or(0);

        if !already_waiting {
            claimants.insert(claimant.clone(), ClaimantState::Waiting);
            tracing::info!(claimant = %claimant, ahead, "Claimant queued");
            self.sink.emit(&WorkflowEvent::ClaimantQueued {
                claimant: claimant.clone(),
                ahead,
                at: now,
            });
        }

        if !at_head {
            return AdmissionOutcome::Waiting { ahead };
        }

        self.reserve(claimants, claimant, now)
    }

    fn reserve(
        &self,
        claimants: &mut ClaimantTable,
        claimant: &ClaimantId,
        now: DateTime<Utc>,
    ) -> AdmissionOutcome {
        if self.pool.is_sold_out() {
            tracing::warn!(claimant = %claimant, "At the head but no ticket left");
            return AdmissionOutcome::Waiting { ahead: 0 };
        }

        let hold = match self.open_hold(claimant) {
            Ok(hold) => hold,
            Err(error) => {
                tracing::error!(
                    claimant = %claimant,
                    reason = error.as_label(),
                    "Could not open a hold; claimant leaves the queue"
                );
                self.evict(claimants, claimant, EvictionReason::HoldRejected(error), now);
                return AdmissionOutcome::Refused(error);
            }
        };

        // hold first: a refused hold must not consume a ticket
        if !self.pool.try_consume() {
            self.reservations.remove(claimant);
            tracing::warn!(claimant = %claimant, "At the head but no ticket left");
            return AdmissionOutcome::Waiting { ahead: 0 };
        }

        claimants.insert(claimant.clone(), ClaimantState::Reserved(hold.id));
        let tickets_left = self.pool.available();
        let waited_secs = self
            .queue
            .waited_for(claimant, now)
            .map_or(0, |waited| waited.num_seconds());

        tracing::info!(
            claimant = %claimant,
            hold_id = %hold.id,
            expires_at = %hold.expires_at,
            tickets_left,
            waited_secs,
            "Ticket reserved"
        );
        metrics::record_reservation("reserved");
        self.sink.emit(&WorkflowEvent::TicketReserved {
            claimant: claimant.clone(),
            hold_id: hold.id,
            expires_at: hold.expires_at.inner(),
            tickets_left,
            at: now,
        });

        AdmissionOutcome::ReservedFor(self.config.hold_duration_secs)
    }

    fn recheck_hold(
        &self,
        claimants: &mut ClaimantTable,
        claimant: &ClaimantId,
        hold_id: HoldId,
        now: DateTime<Utc>,
    ) -> AdmissionOutcome {
        if !self.reservations.is_valid(claimant) {
            self.expire(claimants, claimant, hold_id, now);
            return AdmissionOutcome::Refused(WorkflowError::ReservationExpired);
        }

        // refresh liveness only; the claimant is already at the head
        self.queue.join(claimant, now);
        let seconds = self
            .reservations
            .remaining(claimant)
            .and_then(|left| u64::try_from(left.num_seconds()).ok())
            .unwrap_or(0);
        AdmissionOutcome::ReservedFor(seconds)
    }

    fn complete(
        &self,
        claimants: &mut ClaimantTable,
        claimant: &ClaimantId,
        hold_id: HoldId,
        now: DateTime<Utc>,
    ) -> TicketCode {
        self.release_slot(claimant);
        self.reservations.remove(claimant);

        let ticket = TicketCode::issue(claimant, now);
        claimants.insert(claimant.clone(), ClaimantState::Completed(ticket.clone()));

        tracing::info!(claimant = %claimant, hold_id = %hold_id, ticket = %ticket, "Purchase completed");
        metrics::record_reservation("completed");
        self.sink.emit(&WorkflowEvent::PurchaseCompleted {
            claimant: claimant.clone(),
            hold_id,
            ticket: ticket.clone(),
            at: now,
        });

        ticket
    }

    fn decline(&self, claimant: &ClaimantId, hold_id: HoldId, now: DateTime<Utc>) -> FinalizeOutcome {
        let remaining_seconds = self
            .reservations
            .remaining(claimant)
            .and_then(|left| u64::try_from(left.num_seconds()).ok())
            .unwrap_or(0);

        tracing::warn!(claimant = %claimant, hold_id = %hold_id, remaining_seconds, "Payment declined");
        metrics::record_reservation("declined");
        self.sink.emit(&WorkflowEvent::PaymentDeclined {
            claimant: claimant.clone(),
            hold_id,
            remaining_seconds,
            at: now,
        });

        FinalizeOutcome::Declined { remaining_seconds }
    }

    fn expire(
        &self,
        claimants: &mut ClaimantTable,
        claimant: &ClaimantId,
        hold_id: HoldId,
        now: DateTime<Utc>,
    ) {
        self.release_slot(claimant);
        self.reservations.remove(claimant);
        claimants.insert(claimant.clone(), ClaimantState::Expired);

        tracing::warn!(claimant = %claimant, hold_id = %hold_id, "Reservation expired");
        metrics::record_reservation("expired");
        self.sink.emit(&WorkflowEvent::ReservationExpired {
            claimant: claimant.clone(),
            hold_id,
            at: now,
        });
    }

    /// Opens a hold for a waiting head.
    ///
    /// A waiting claimant never owns a hold, so one found in the store is a stray
    /// leftover: it is dropped and creation retried once.
    fn open_hold(&self, claimant: &ClaimantId) -> Result<Hold, WorkflowError> {
        let duration = self.config.hold_duration();
        match self.reservations.create(claimant, duration) {
            Err(WorkflowError::AlreadyReserved) => {
                tracing::error!(claimant = %claimant, "Dropping stray hold for a waiting claimant");
                self.reservations.remove(claimant);
                self.reservations.create(claimant, duration)
            }
            result => result,
        }
    }

    fn evict(
        &self,
        claimants: &mut ClaimantTable,
        claimant: &ClaimantId,
        reason: EvictionReason,
        now: DateTime<Utc>,
    ) {
        self.queue.remove(claimant);
        claimants.remove(claimant);

        let label = match reason {
            EvictionReason::SoldOut => "sold_out",
            EvictionReason::Idle { .. } => "idle",
            EvictionReason::HoldRejected(_) => "hold_rejected",
        };
        tracing::info!(claimant = %claimant, reason = label, "Claimant evicted from queue");
        metrics::record_eviction(label);
        self.sink.emit(&WorkflowEvent::ClaimantEvicted {
            claimant: claimant.clone(),
            reason,
            at: now,
        });
    }

    /// No ticket left and no hold in flight that could still settle.
    ///
    /// While the head holds a ticket, newcomers queue behind it and learn the
    /// final answer on their first poll after the hold settles.
    fn is_sold_out(&self) -> bool {
        self.pool.is_sold_out() && self.reservations.active_count() == 0
    }

    /// Frees the queue slot of a reserved claimant, which is always the head.
    fn release_slot(&self, claimant: &ClaimantId) {
        if self.queue.head().as_ref() == Some(claimant) {
            self.queue.advance();
        } else if self.queue.remove(claimant) {
            tracing::warn!(claimant = %claimant, "Released claimant was not at the head");
        }
    }

    fn sweep_head(
        &self,
        claimants: &mut ClaimantTable,
        exempt: Option<&ClaimantId>,
        now: DateTime<Utc>,
    ) -> usize {
        let mut released = 0;

        while let Some(head) = self.queue.head() {
            match state_of(claimants, &head) {
                ClaimantState::Reserved(hold_id) => {
                    if self.reservations.is_valid(&head) {
                        break;
                    }
                    self.expire(claimants, &head, hold_id, now);
                }
                ClaimantState::Waiting => {
                    let Some(timeout) = self.config.head_idle_timeout() else {
                        break;
                    };
                    if exempt == Some(&head) {
                        break;
                    }
                    let Some((_, idle)) = self.queue.head_idle_for(now) else {
                        break;
                    };
                    if idle <= timeout {
                        break;
                    }
                    self.evict(
                        claimants,
                        &head,
                        EvictionReason::Idle {
                            idle_seconds: idle.num_seconds(),
                        },
                        now,
                    );
                }
                state => {
                    tracing::warn!(claimant = %head, state = ?state, "Dropping stale queue entry");
                    self.queue.advance();
                }
            }
            released += 1;
        }

        released
    }
}

impl std::fmt::Debug for ReservationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationCoordinator")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("queue_len", &self.queue.len())
            .field("reservations", &self.reservations)
            .finish_non_exhaustive()
    }
}

fn state_of(claimants: &ClaimantTable, claimant: &ClaimantId) -> ClaimantState {
    claimants
        .get(claimant)
        .cloned()
        .unwrap_or(ClaimantState::NotQueued)
}
