//! Reservation store: per-claimant holds with lazy expiry.
//!
//! There is no background sweeper. A hold past its expiry is treated as absent and
//! removed the next time anyone looks at it through [`ReservationStore::is_valid`]
//! or [`ReservationStore::create`].

use crate::error::WorkflowError;
use crate::types::{ClaimantId, Hold};
use chrono::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use ticket_queue_core::environment::Clock;

/// Expiring holds keyed by claimant
pub struct ReservationStore {
    clock: Arc<dyn Clock>,
    holds: Mutex<HashMap<ClaimantId, Hold>>,
}

impl ReservationStore {
    /// Creates an empty store reading time from `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            holds: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a hold lasting `duration` for `claimant`.
    ///
    /// An expired leftover is replaced. The store is left untouched on error.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::AlreadyReserved`] if the claimant already holds an active hold
    /// - [`WorkflowError::HoldOutOfRange`] if `now + duration` overflows the calendar
    pub fn create(
        &self,
        claimant: &ClaimantId,
        duration: Duration,
    ) -> Result<Hold, WorkflowError> {
        let now = self.clock.now();
        let mut holds = self.holds.lock();

        if holds.get(claimant).is_some_and(|hold| hold.is_active(now)) {
            return Err(WorkflowError::AlreadyReserved);
        }

        let hold =
            Hold::new(claimant.clone(), now, duration).ok_or(WorkflowError::HoldOutOfRange)?;
        holds.insert(claimant.clone(), hold.clone());
        Ok(hold)
    }

    /// Whether `claimant` holds an active hold.
    ///
    /// An expired hold is deleted as a side effect.
    pub fn is_valid(&self, claimant: &ClaimantId) -> bool {
        let now = self.clock.now();
        let mut holds = self.holds.lock();

        let Some(hold) = holds.get(claimant) else {
            return false;
        };
        if hold.is_active(now) {
            return true;
        }

        tracing::debug!(
            claimant = %claimant,
            hold_id = %hold.id,
            expired_at = %hold.expires_at,
            "Dropping expired hold"
        );
        holds.remove(claimant);
        false
    }

    /// Deletes the hold for `claimant`, active or not. Idempotent.
    pub fn remove(&self, claimant: &ClaimantId) -> Option<Hold> {
        self.holds.lock().remove(claimant)
    }

    /// The active hold for `claimant`, without side effects
    #[must_use]
    pub fn get(&self, claimant: &ClaimantId) -> Option<Hold> {
        let now = self.clock.now();
        self.holds
            .lock()
            .get(claimant)
            .filter(|hold| hold.is_active(now))
            .cloned()
    }

    /// Time left on the active hold for `claimant`
    #[must_use]
    pub fn remaining(&self, claimant: &ClaimantId) -> Option<Duration> {
        let now = self.clock.now();
        self.get(claimant).map(|hold| hold.expires_at.remaining(now))
    }

    /// Number of holds that are still active
    #[must_use]
    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        self.holds
            .lock()
            .values()
            .filter(|hold| hold.is_active(now))
            .count()
    }
}

impl std::fmt::Debug for ReservationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationStore")
            .field("holds", &self.holds.lock().len())
            .finish_non_exhaustive()
    }
}
