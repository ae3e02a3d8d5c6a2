//! Payment outcome simulators.
//!
//! The engine never processes payments. It only receives a success/failure
//! signal per attempt through `check_and_finalize`. These simulators produce
//! that signal for the demo binary and for tests.

use crate::types::ClaimantId;
use rand::Rng;
use std::sync::Arc;

/// Source of payment outcomes
pub trait PaymentSimulator: Send + Sync {
    /// Attempt a payment for `claimant`; `true` means the payment went through
    fn attempt(&self, claimant: &ClaimantId) -> bool;
}

/// Random outcomes with a fixed success probability
#[derive(Clone, Debug)]
pub struct RandomPayments {
    success_rate: f64,
}

impl RandomPayments {
    /// Success probability used when none is configured
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

    /// Creates a simulator succeeding with probability `success_rate`
    /// (clamped to `[0, 1]`)
    #[must_use]
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            Self::DEFAULT_SUCCESS_RATE
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(success_rate: f64) -> Arc<dyn PaymentSimulator> {
        Arc::new(Self::new(success_rate))
    }

    /// The configured success probability
    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for RandomPayments {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE)
    }
}

impl PaymentSimulator for RandomPayments {
    fn attempt(&self, claimant: &ClaimantId) -> bool {
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        if approved {
            tracing::info!(claimant = %claimant, "Simulated payment approved");
        } else {
            tracing::warn!(claimant = %claimant, "Simulated payment declined");
        }
        approved
    }
}

/// Always returns the same outcome
#[derive(Clone, Copy, Debug)]
pub struct FixedPayments(pub bool);

impl FixedPayments {
    /// Simulator that approves every attempt
    #[must_use]
    pub const fn approve_all() -> Self {
        Self(true)
    }

    /// Simulator that declines every attempt
    #[must_use]
    pub const fn decline_all() -> Self {
        Self(false)
    }
}

impl PaymentSimulator for FixedPayments {
    fn attempt(&self, _claimant: &ClaimantId) -> bool {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn certain_outcomes_are_deterministic() {
        let claimant = ClaimantId::new("Ana").unwrap();

        let always = RandomPayments::new(1.0);
        let never = RandomPayments::new(0.0);
        for _ in 0..20 {
            assert!(always.attempt(&claimant));
            assert!(!never.attempt(&claimant));
        }
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        assert!((RandomPayments::new(3.0).success_rate() - 1.0).abs() < f64::EPSILON);
        assert!(RandomPayments::new(-1.0).success_rate().abs() < f64::EPSILON);
        assert!(
            (RandomPayments::new(f64::NAN).success_rate() - RandomPayments::DEFAULT_SUCCESS_RATE)
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn fixed_payments() {
        let claimant = ClaimantId::new("Ana").unwrap();
        assert!(FixedPayments::approve_all().attempt(&claimant));
        assert!(!FixedPayments::decline_all().attempt(&claimant));
    }
}
