//! Ticket pool: the count of tickets still for sale.
//!
//! **Concurrency Strategy**: the remaining count lives in a single `AtomicU32` and
//! is only ever decremented through a compare-and-swap loop, so concurrent
//! callers can never take the count below zero (the "last ticket" problem).
//!
//! There is no replenishment. A ticket taken for a hold that later expires stays
//! consumed.

use std::sync::atomic::{AtomicU32, Ordering};

/// Bounded pool of sellable tickets
#[derive(Debug)]
pub struct TicketPool {
    capacity: u32,
    remaining: AtomicU32,
}

impl TicketPool {
    /// Creates a pool holding `capacity` tickets
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self {
            capacity,
            remaining: AtomicU32::new(capacity),
        }
    }

    /// Tickets the pool started with
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tickets still available
    #[must_use]
    pub fn available(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Tickets consumed so far
    #[must_use]
    pub fn consumed(&self) -> u32 {
        self.capacity.saturating_sub(self.available())
    }

    /// Whether every ticket has been consumed
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.available() == 0
    }

    /// Takes one ticket.
    ///
    /// Returns `true` iff a ticket was available at the time of the call; a
    /// `false` result leaves the pool untouched.
    pub fn try_consume(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn consumes_until_empty() {
        let pool = TicketPool::new(2);

        assert!(pool.try_consume());
        assert!(pool.try_consume());
        assert!(!pool.try_consume());

        assert_eq!(pool.available(), 0);
        assert_eq!(pool.consumed(), 2);
        assert!(pool.is_sold_out());
    }

    #[test]
    fn empty_pool_never_underflows() {
        let pool = TicketPool::new(0);

        for _ in 0..10 {
            assert!(!pool.try_consume());
        }
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn concurrent_consumers_never_oversell() {
        let pool = Arc::new(TicketPool::new(7));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || (0..4).filter(|_| pool.try_consume()).count())
            })
            .collect();

        let sold: usize = handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(0))
            .sum();

        assert_eq!(sold, 7);
        assert_eq!(pool.available(), 0);
    }
}
