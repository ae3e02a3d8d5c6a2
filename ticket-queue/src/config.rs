//! Configuration management for the ticket queue.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Admission and reservation rules
    pub workflow: WorkflowConfig,
    /// Payment simulator configuration
    pub payment: PaymentConfig,
    /// Demo driver configuration
    pub demo: DemoConfig,
    /// Log filter (RUST_LOG syntax)
    pub log_level: String,
}

/// Rules the coordinator enforces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Tickets available for the whole run
    pub pool_size: u32,
    /// How long a reservation hold lasts, in seconds
    pub hold_duration_secs: u64,
    /// Evict a waiting head that has not polled for this many seconds (None = never)
    pub head_idle_timeout_secs: Option<u64>,
}

/// Payment simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Probability that a payment attempt succeeds
    pub success_rate: f64,
}

/// Demo driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Number of simulated claimants
    pub claimants: usize,
    /// Delay between admission polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Payment attempts per claimant before giving up
    pub max_payment_attempts: u32,
}

impl WorkflowConfig {
    /// Default pool size
    pub const DEFAULT_POOL_SIZE: u32 = 5;
    /// Default hold duration (10 minutes)
    pub const DEFAULT_HOLD_DURATION_SECS: u64 = 600;
    /// Longest accepted hold (one year)
    pub const MAX_HOLD_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

    /// Hold duration as a `chrono::Duration`, saturating at `Duration::MAX`
    #[must_use]
    pub fn hold_duration(&self) -> Duration {
        saturating_seconds(self.hold_duration_secs)
    }

    /// Idle timeout for the waiting head, if enabled
    #[must_use]
    pub fn head_idle_timeout(&self) -> Option<Duration> {
        self.head_idle_timeout_secs.map(saturating_seconds)
    }

    /// Check the values make sense.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty pool, a zero hold duration, or a hold
    /// longer than [`Self::MAX_HOLD_DURATION_SECS`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.hold_duration_secs == 0 {
            return Err(ConfigError::ZeroHoldDuration);
        }
        if self.hold_duration_secs > Self::MAX_HOLD_DURATION_SECS {
            return Err(ConfigError::HoldDurationTooLong {
                secs: self.hold_duration_secs,
                max: Self::MAX_HOLD_DURATION_SECS,
            });
        }
        Ok(())
    }
}

fn saturating_seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pool_size: Self::DEFAULT_POOL_SIZE,
            hold_duration_secs: Self::DEFAULT_HOLD_DURATION_SECS,
            head_idle_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            workflow: WorkflowConfig {
                pool_size: env::var("TICKET_POOL_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(WorkflowConfig::DEFAULT_POOL_SIZE),
                hold_duration_secs: env::var("HOLD_DURATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(WorkflowConfig::DEFAULT_HOLD_DURATION_SECS),
                head_idle_timeout_secs: env::var("HEAD_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
            payment: PaymentConfig {
                success_rate: env::var("PAYMENT_SUCCESS_RATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.9),
            },
            demo: DemoConfig {
                claimants: env::var("DEMO_CLAIMANTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8),
                poll_interval_ms: env::var("DEMO_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(200),
                max_payment_attempts: env::var("DEMO_MAX_PAYMENT_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            },
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workflow.validate()?;
        if !(0.0..=1.0).contains(&self.payment.success_rate) {
            return Err(ConfigError::InvalidSuccessRate(self.payment.success_rate));
        }
        Ok(())
    }
}
