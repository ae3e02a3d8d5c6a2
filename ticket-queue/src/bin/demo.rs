//! Ticket Queue Demo
//!
//! Simulates a crowd of claimants racing for a small pool:
//! - Everyone asks for admission at once and polls until it is their turn
//! - The head takes a ticket and tries to pay (simulated, may be declined)
//! - Late arrivals are turned away once the pool is sold out
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 5 tickets, 8 claimants, 90% payment success
//! cargo run --bin demo
//!
//! # Short holds so walk-aways free the queue quickly
//! HOLD_DURATION_SECS=3 PAYMENT_SUCCESS_RATE=0.5 cargo run --bin demo
//! ```

use std::sync::Arc;
use std::time::Duration;
use ticket_queue::{
    AdmissionOutcome, ClaimantId, Config, FinalizeOutcome, PaymentSimulator, RandomPayments,
    ReservationCoordinator, TicketCode, WorkflowError, WorkflowEvent, metrics,
};
use ticket_queue_core::environment::SystemClock;
use ticket_queue_core::event_sink::TracingSink;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NAMES: [&str; 12] = [
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fabio", "Gabi", "Hugo", "Iris", "Joao", "Karen",
    "Lucas",
];

/// How a simulated claimant's run ended
#[derive(Debug)]
enum Finish {
    Bought(TicketCode),
    Expired,
    SoldOut,
    GaveUp { attempts: u32 },
    Refused(WorkflowError),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate()?;
    metrics::register_queue_metrics();

    println!("\n🎫 ============================================");
    println!("   Ticket Queue - Live Demo");
    println!("============================================\n");
    println!("   Tickets:   {}", config.workflow.pool_size);
    println!("   Hold:      {}s", config.workflow.hold_duration_secs);
    println!("   Claimants: {}", config.demo.claimants);
    println!("   Payments:  {:.0}% success\n", config.payment.success_rate * 100.0);

    let coordinator = Arc::new(ReservationCoordinator::new(
        config.workflow.clone(),
        Arc::new(SystemClock),
        Arc::new(TracingSink::<WorkflowEvent>::new("ticket_queue")),
    ));
    let payments = RandomPayments::shared(config.payment.success_rate);
    let poll = Duration::from_millis(config.demo.poll_interval_ms);

    // Periodic sweep so a walked-away head does not stall the queue between polls
    let sweeper = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll);
            loop {
                ticker.tick().await;
                let released = coordinator.sweep();
                if released > 0 {
                    tracing::info!(released, "Sweep released queue slots");
                }
            }
        })
    };

    let mut handles = Vec::with_capacity(config.demo.claimants);
    for index in 0..config.demo.claimants {
        let name = NAMES
            .get(index)
            .map_or_else(|| format!("Guest{index}"), |name| (*name).to_string());
        let claimant = ClaimantId::new(name)?;
        let coordinator = Arc::clone(&coordinator);
        let payments = Arc::clone(&payments);
        let attempts = config.demo.max_payment_attempts;

        handles.push(tokio::spawn(async move {
            let finish = run_claimant(&coordinator, &*payments, &claimant, poll, attempts).await;
            (claimant, finish)
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }
    sweeper.abort();

    println!("\n📋 Results:");
    for (claimant, finish) in &results {
        match finish {
            Finish::Bought(ticket) => println!("   ✓ {claimant}: bought ticket {ticket}"),
            Finish::Expired => println!("   ⌛ {claimant}: hold expired before payment"),
            Finish::SoldOut => println!("   ✗ {claimant}: sold out"),
            Finish::GaveUp { attempts } => {
                println!("   ✗ {claimant}: gave up after {attempts} declined payments");
            }
            Finish::Refused(error) => println!("   ✗ {claimant}: refused ({error})"),
        }
    }

    let sold = results
        .iter()
        .filter(|(_, finish)| matches!(finish, Finish::Bought(_)))
        .count();
    println!("\n📊 Pool:");
    println!("   - Capacity:  {}", coordinator.capacity());
    println!("   - Sold:      {sold}");
    println!("   - Available: {}", coordinator.available_tickets());
    println!("   - Queued:    {}", coordinator.queue_len());
    println!("\n✨ Demo completed");

    Ok(())
}

/// Polls for admission, then pays within the hold window.
async fn run_claimant(
    coordinator: &ReservationCoordinator,
    payments: &dyn PaymentSimulator,
    claimant: &ClaimantId,
    poll: Duration,
    max_attempts: u32,
) -> Finish {
    loop {
        match coordinator.request_admission(claimant) {
            AdmissionOutcome::ReservedFor(seconds) => {
                tracing::debug!(claimant = %claimant, seconds, "Holding a ticket");
                break;
            }
            AdmissionOutcome::Waiting { ahead } => {
                tracing::debug!(claimant = %claimant, ahead, "Waiting for turn");
                tokio::time::sleep(poll).await;
            }
            AdmissionOutcome::Refused(WorkflowError::SoldOut) => return Finish::SoldOut,
            AdmissionOutcome::Refused(error) => return Finish::Refused(error),
        }
    }

    for _ in 0..max_attempts {
        match coordinator.check_and_finalize(claimant, payments.attempt(claimant)) {
            FinalizeOutcome::Completed(ticket) => return Finish::Bought(ticket),
            FinalizeOutcome::Expired => return Finish::Expired,
            outcome => {
                if let Some(error) = outcome.error() {
                    tracing::debug!(
                        claimant = %claimant,
                        reason = error.as_label(),
                        retryable = error.is_retryable(),
                        "Purchase not completed"
                    );
                }
                tokio::time::sleep(poll).await;
            }
        }
    }

    // walks away still holding the ticket; the sweep expires it once the hold lapses
    Finish::GaveUp {
        attempts: max_attempts,
    }
}
