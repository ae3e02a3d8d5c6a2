//! Property tests for queue ordering and pool accounting.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use std::sync::Arc;
use ticket_queue::{
    AdmissionOutcome, ClaimantId, FairnessQueue, ReservationCoordinator, WorkflowConfig,
};
use ticket_queue_core::environment::Clock;
use ticket_queue_core::event_sink::NullSink;
use ticket_queue_testing::properties::join_sequence;
use ticket_queue_testing::{ManualClock, test_clock};

/// Queue operation drawn by the strategy
#[derive(Clone, Debug)]
enum Op {
    Join(String),
    Advance,
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    join_sequence(40).prop_flat_map(|names| {
        let len = names.len();
        (Just(names), proptest::collection::vec(any::<bool>(), len)).prop_map(|(names, flips)| {
            names
                .into_iter()
                .zip(flips)
                .map(|(name, advance)| if advance { Op::Advance } else { Op::Join(name) })
                .collect()
        })
    })
}

proptest! {
    /// The head is always the earliest-joining claimant still present, and
    /// repeated joins never duplicate entries.
    #[test]
    fn head_is_earliest_present_joiner(ops in ops()) {
        let queue = FairnessQueue::new();
        let now = test_clock().now();
        let mut model: Vec<ClaimantId> = Vec::new();

        for op in ops {
            match op {
                Op::Join(name) => {
                    let claimant = ClaimantId::new(&name).unwrap();
                    if !model.contains(&claimant) {
                        model.push(claimant.clone());
                    }
                    let at_head = queue.join(&claimant, now);
                    prop_assert_eq!(at_head, model.first() == Some(&claimant));
                }
                Op::Advance => {
                    let removed = queue.advance();
                    let expected = (!model.is_empty()).then(|| model.remove(0));
                    prop_assert_eq!(removed, expected);
                }
            }
            prop_assert_eq!(queue.snapshot(), model.clone());
            prop_assert_eq!(queue.head(), model.first().cloned());
        }
    }

    /// However claimants poll, pay, and let holds lapse, the pool never hands
    /// out more tickets than it started with.
    #[test]
    fn coordinator_never_oversells(
        names in join_sequence(60),
        pool_size in 1u32..6,
        pays in proptest::collection::vec(any::<bool>(), 60),
    ) {
        let clock = Arc::new(ManualClock::default());
        let coordinator = ReservationCoordinator::new(
            WorkflowConfig { pool_size, hold_duration_secs: 10, head_idle_timeout_secs: None },
            clock.clone(),
            Arc::new(NullSink),
        );

        let mut reservations = 0u32;
        for (name, pay) in names.iter().zip(pays.iter().copied()) {
            let claimant = ClaimantId::new(name).unwrap();
            if let AdmissionOutcome::ReservedFor(seconds) = coordinator.request_admission(&claimant) {
                if seconds == 10 {
                    reservations += 1;
                }
                if pay {
                    coordinator.check_and_finalize(&claimant, true);
                }
            }
            clock.advance_secs(3);
            prop_assert!(coordinator.available_tickets() <= pool_size);
        }

        prop_assert!(reservations <= pool_size);
        prop_assert_eq!(coordinator.available_tickets(), pool_size - reservations);
    }
}
