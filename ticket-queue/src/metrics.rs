//! Business metrics for the ticket queue.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the host
//! process installs a recorder.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticket_queue_admissions_total{outcome}` - Admission requests by outcome
//! - `ticket_queue_reservations_total{status}` - Holds by lifecycle step
//!   (reserved, completed, expired, declined)
//! - `ticket_queue_evictions_total{reason}` - Waiting claimants removed from the queue
//!
//! ## Gauges
//! - `ticket_queue_tickets_available` - Tickets left in the pool
//! - `ticket_queue_waiting` - Claimants currently queued

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_queue_metrics() {
    describe_counter!(
        "ticket_queue_admissions_total",
        "Admission requests by outcome (refused, waiting, reserved)"
    );
    describe_counter!(
        "ticket_queue_reservations_total",
        "Reservation holds by lifecycle step (reserved, completed, expired, declined)"
    );
    describe_counter!(
        "ticket_queue_evictions_total",
        "Waiting claimants removed from the queue by reason"
    );
    describe_gauge!(
        "ticket_queue_tickets_available",
        "Tickets still available in the pool"
    );
    describe_gauge!("ticket_queue_waiting", "Claimants currently in the queue");

    tracing::info!("Queue metrics registered");
}

/// Count one admission request.
pub fn record_admission(outcome: &'static str) {
    counter!("ticket_queue_admissions_total", "outcome" => outcome).increment(1);
}

/// Count one hold lifecycle step.
pub fn record_reservation(status: &'static str) {
    counter!("ticket_queue_reservations_total", "status" => status).increment(1);
}

/// Count one eviction.
pub fn record_eviction(reason: &'static str) {
    counter!("ticket_queue_evictions_total", "reason" => reason).increment(1);
}

/// Publish pool and queue levels.
pub fn record_levels(tickets_available: u32, waiting: usize) {
    gauge!("ticket_queue_tickets_available").set(f64::from(tickets_available));
    #[allow(clippy::cast_precision_loss)] // queue lengths stay far below 2^52
    let waiting = waiting as f64;
    gauge!("ticket_queue_waiting").set(waiting);
}
