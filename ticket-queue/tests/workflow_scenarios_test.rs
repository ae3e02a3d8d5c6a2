//! End-to-end workflow scenarios driven by a manual clock.
//!
//! Each test walks one or more claimants through the admission, hold, and payment
//! steps and checks outcomes, pool levels, and the emitted events.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

use std::sync::Arc;
use ticket_queue::{
    AdmissionOutcome, ClaimantId, ClaimantStatus, EvictionReason, FinalizeOutcome, FixedPayments,
    PaymentSimulator, ReservationCoordinator, WorkflowConfig, WorkflowError, WorkflowEvent,
};
use ticket_queue_testing::{ManualClock, RecordingSink, init_test_tracing};

struct Scenario {
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink<WorkflowEvent>>,
    coordinator: ReservationCoordinator,
}

impl Scenario {
    fn new(config: WorkflowConfig) -> Self {
        init_test_tracing();
        let clock = Arc::new(ManualClock::default());
        let sink = Arc::new(RecordingSink::new());
        let coordinator = ReservationCoordinator::new(config, clock.clone(), sink.clone());
        Self {
            clock,
            sink,
            coordinator,
        }
    }

    fn with_pool(pool_size: u32) -> Self {
        Self::new(WorkflowConfig {
            pool_size,
            ..WorkflowConfig::default()
        })
    }
}

fn id(name: &str) -> ClaimantId {
    ClaimantId::new(name).unwrap()
}

/// Pool of one: A buys, B waits behind the hold and is then turned away.
#[test]
fn test_single_ticket_goes_to_first_claimant() {
    let s = Scenario::with_pool(1);
    let (a, b) = (id("Alice"), id("Bob"));

    assert_eq!(
        s.coordinator.request_admission(&a),
        AdmissionOutcome::ReservedFor(600)
    );
    assert_eq!(
        s.coordinator.request_admission(&b),
        AdmissionOutcome::Waiting { ahead: 1 }
    );

    let outcome = s.coordinator.check_and_finalize(&a, true);
    assert!(matches!(outcome, FinalizeOutcome::Completed(_)));

    assert_eq!(
        s.coordinator.request_admission(&b),
        AdmissionOutcome::Refused(WorkflowError::SoldOut)
    );
    assert_eq!(s.coordinator.available_tickets(), 0);
    assert_eq!(s.coordinator.queue_len(), 0);

    // a newcomer after the pool settled is never queued
    assert_eq!(
        s.coordinator.request_admission(&id("Carol")),
        AdmissionOutcome::Refused(WorkflowError::SoldOut)
    );
    assert_eq!(s.coordinator.queue_len(), 0);
}

/// Pool of two: B queues behind A, then gets the last ticket once A is done.
#[test]
fn test_waiting_claimant_reserves_after_head_completes() {
    let s = Scenario::with_pool(2);
    let (a, b) = (id("Alice"), id("Bob"));

    s.coordinator.request_admission(&a);
    assert_eq!(
        s.coordinator.request_admission(&b),
        AdmissionOutcome::Waiting { ahead: 1 }
    );
    // polling again does not move B or duplicate it
    assert_eq!(
        s.coordinator.request_admission(&b),
        AdmissionOutcome::Waiting { ahead: 1 }
    );
    assert_eq!(s.coordinator.queue_snapshot(), vec![a.clone(), b.clone()]);

    s.coordinator.check_and_finalize(&a, true);
    assert_eq!(
        s.coordinator.request_admission(&b),
        AdmissionOutcome::ReservedFor(600)
    );
    assert_eq!(s.coordinator.available_tickets(), 0);
}

/// A one-second hold left alone for two seconds expires and keeps its ticket.
#[test]
fn test_lapsed_hold_expires_without_refund() {
    let s = Scenario::new(WorkflowConfig {
        pool_size: 5,
        hold_duration_secs: 1,
        head_idle_timeout_secs: None,
    });
    let a = id("Alice");

    assert_eq!(
        s.coordinator.request_admission(&a),
        AdmissionOutcome::ReservedFor(1)
    );
    s.clock.advance_secs(2);

    assert_eq!(
        s.coordinator.check_and_finalize(&a, true),
        FinalizeOutcome::Expired
    );
    assert_eq!(s.coordinator.available_tickets(), 4);
    assert_eq!(s.coordinator.status(&a), ClaimantStatus::Expired);
    assert_eq!(
        s.coordinator.request_admission(&a),
        AdmissionOutcome::Refused(WorkflowError::ReservationExpired)
    );
}

/// Paying at exactly the expiry instant still counts.
#[test]
fn test_payment_at_expiry_instant_completes() {
    let s = Scenario::with_pool(5);
    let a = id("Alice");

    s.coordinator.request_admission(&a);
    s.clock.advance_secs(600);

    assert!(matches!(
        s.coordinator.check_and_finalize(&a, true),
        FinalizeOutcome::Completed(_)
    ));
}

/// Declined payments keep the hold; a later success inside the window completes.
#[test]
fn test_declined_payment_can_be_retried() {
    let s = Scenario::with_pool(5);
    let a = id("Alice");
    let declining = FixedPayments::decline_all();
    let approving = FixedPayments::approve_all();

    s.coordinator.request_admission(&a);
    s.clock.advance_secs(30);
    assert_eq!(
        s.coordinator.check_and_finalize(&a, declining.attempt(&a)),
        FinalizeOutcome::Declined {
            remaining_seconds: 570
        }
    );
    s.clock.advance_secs(30);

    let outcome = s.coordinator.check_and_finalize(&a, approving.attempt(&a));
    let FinalizeOutcome::Completed(ticket) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(ticket.as_str(), "#000100ALI");
    assert_eq!(
        s.coordinator.status(&a),
        ClaimantStatus::Completed { ticket }
    );
}

/// A head that walks away is expired by the next poll from behind it.
#[test]
fn test_vanished_head_is_swept_by_next_poll() {
    let s = Scenario::with_pool(5);
    let (a, b) = (id("Alice"), id("Bob"));

    s.coordinator.request_admission(&a);
    s.coordinator.request_admission(&b);
    s.clock.advance_secs(601);

    assert_eq!(
        s.coordinator.request_admission(&b),
        AdmissionOutcome::ReservedFor(600)
    );
    assert_eq!(s.coordinator.status(&a), ClaimantStatus::Expired);
    assert_eq!(s.coordinator.available_tickets(), 3);
}

/// A waiting head that stops polling is evicted once idle eviction is enabled.
#[test]
fn test_idle_waiting_head_is_evicted_by_sweep() {
    let s = Scenario::new(WorkflowConfig {
        head_idle_timeout_secs: Some(30),
        ..WorkflowConfig::default()
    });
    let (a, b, c) = (id("Alice"), id("Bob"), id("Carol"));

    s.coordinator.request_admission(&a);
    s.coordinator.request_admission(&b);
    s.coordinator.request_admission(&c);
    s.coordinator.check_and_finalize(&a, true);

    s.clock.advance_secs(20);
    assert_eq!(s.coordinator.sweep(), 0);
    s.coordinator.request_admission(&c);

    s.clock.advance_secs(11);
    assert_eq!(s.coordinator.sweep(), 1);
    assert_eq!(s.coordinator.status(&b), ClaimantStatus::NotQueued);
    assert_eq!(s.coordinator.queue_snapshot(), vec![c.clone()]);

    let evicted: Vec<_> = s
        .sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            WorkflowEvent::ClaimantEvicted {
                claimant, reason, ..
            } => Some((claimant, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(
        evicted,
        vec![(b, EvictionReason::Idle { idle_seconds: 31 })]
    );

    // C refreshed at t=20, so it is only 11s idle and stays
    assert_eq!(
        s.coordinator.request_admission(&c),
        AdmissionOutcome::ReservedFor(600)
    );
}

/// Reset lets a finished claimant go through the workflow again.
#[test]
fn test_reset_restarts_workflow() {
    let s = Scenario::with_pool(5);
    let a = id("Alice");

    s.coordinator.request_admission(&a);
    s.coordinator.check_and_finalize(&a, true);
    assert_eq!(
        s.coordinator.request_admission(&a),
        AdmissionOutcome::Refused(WorkflowError::AlreadyCompleted)
    );

    assert!(s.coordinator.reset(&a));
    assert_eq!(
        s.coordinator.request_admission(&a),
        AdmissionOutcome::ReservedFor(600)
    );
    assert_eq!(s.coordinator.available_tickets(), 3);
    assert!(s.sink.event_types().contains(&"ClaimantReset.v1"));
}

/// Every transition emits exactly one event, in order, and polls emit nothing.
#[test]
fn test_transition_events_are_emitted_once() {
    let s = Scenario::with_pool(5);
    let (a, b) = (id("Alice"), id("Bob"));

    s.coordinator.request_admission(&a);
    s.coordinator.request_admission(&a);
    s.coordinator.request_admission(&b);
    s.coordinator.status(&b);
    s.coordinator.check_and_finalize(&a, true);
    s.coordinator.check_and_finalize(&a, true);
    s.coordinator.request_admission(&b);
    s.clock.advance_secs(601);
    s.coordinator.status(&b);
    s.coordinator.status(&b);

    assert_eq!(
        s.sink.event_types(),
        vec![
            "ClaimantQueued.v1",
            "TicketReserved.v1",
            "ClaimantQueued.v1",
            "PurchaseCompleted.v1",
            "TicketReserved.v1",
            "ReservationExpired.v1",
        ]
    );
    let events = s.sink.events();
    assert!(events.windows(2).all(|pair| pair[0].at() <= pair[1].at()));
    assert_eq!(events[3].claimant(), &a);
    assert_eq!(events[5].claimant(), &b);
}
