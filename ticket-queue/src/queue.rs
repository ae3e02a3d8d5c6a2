//! Fairness queue: strict FIFO admission by first-join time.
//!
//! Only the head of the queue may move on to a reservation. Claimants who are not
//! yet at the head re-poll with [`FairnessQueue::join`]; polling refreshes their
//! liveness timestamp but never reorders or duplicates entries.

use crate::types::ClaimantId;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct QueueEntry {
    claimant: ClaimantId,
    joined_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// Ordered admission list, safe to share between request handlers
#[derive(Debug, Default)]
pub struct FairnessQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
}

impl FairnessQueue {
    /// Creates an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `claimant` at the tail unless already present.
    ///
    /// Returns `true` iff the claimant is at the head afterwards ("your turn").
    pub fn join(&self, claimant: &ClaimantId, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.iter_mut().find(|e| e.claimant == *claimant) {
            entry.last_seen = now;
        } else {
            entries.push_back(QueueEntry {
                claimant: claimant.clone(),
                joined_at: now,
                last_seen: now,
            });
        }

        entries.front().is_some_and(|head| head.claimant == *claimant)
    }

    /// Removes the current head unconditionally; no-op on an empty queue.
    pub fn advance(&self) -> Option<ClaimantId> {
        self.entries.lock().pop_front().map(|entry| entry.claimant)
    }

    /// Removes `claimant` wherever it sits. Returns whether it was present.
    pub fn remove(&self, claimant: &ClaimantId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.claimant != *claimant);
        entries.len() != before
    }

    /// The claimant whose turn it is
    #[must_use]
    pub fn head(&self) -> Option<ClaimantId> {
        self.entries.lock().front().map(|entry| entry.claimant.clone())
    }

    /// Number of claimants ahead of `claimant`, if queued
    #[must_use]
    pub fn position(&self, claimant: &ClaimantId) -> Option<usize> {
        self.entries
            .lock()
            .iter()
            .position(|entry| entry.claimant == *claimant)
    }

    /// Whether `claimant` is queued
    #[must_use]
    pub fn contains(&self, claimant: &ClaimantId) -> bool {
        self.position(claimant).is_some()
    }

    /// Number of queued claimants
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nobody is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Queued claimants, head first
    #[must_use]
    pub fn snapshot(&self) -> Vec<ClaimantId> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.claimant.clone())
            .collect()
    }

    /// The head claimant and how long it has gone without polling
    #[must_use]
    pub fn head_idle_for(&self, now: DateTime<Utc>) -> Option<(ClaimantId, Duration)> {
        self.entries
            .lock()
            .front()
            .map(|head| (head.claimant.clone(), now - head.last_seen))
    }

    /// How long `claimant` has been queued
    #[must_use]
    pub fn waited_for(&self, claimant: &ClaimantId, now: DateTime<Utc>) -> Option<Duration> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.claimant == *claimant)
            .map(|entry| now - entry.joined_at)
    }
}
