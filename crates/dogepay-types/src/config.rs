//! Configuration for the withdrawal pipeline.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DogepayError, Result, constants};

/// Tunable parameters for the Withdrawal Orchestrator and Confirmation Poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Smallest withdrawal a user may request.
    pub min_amount: Decimal,
    /// Largest withdrawal a user may request.
    pub max_amount: Decimal,
    /// Fixed fee charged on every withdrawal.
    pub fee_fixed: Decimal,
    /// Proportional fee on the requested amount (0.01 = 1%).
    pub fee_rate: Decimal,
    /// Bound on a single backend submit call, in milliseconds. Exceeding it
    /// is an ambiguous failure: the engine re-queries before concluding.
    pub dispatch_timeout_ms: u64,
    /// Re-query attempts after an ambiguous dispatch timeout.
    pub requery_attempts: u32,
    /// Delay between re-query attempts, in milliseconds.
    pub requery_delay_ms: u64,
    /// Confirmation poll interval, in milliseconds.
    pub poll_interval_ms: u64,
    /// How long a backend may report a dispatched reference as unknown
    /// before the withdrawal is failed, in milliseconds.
    pub reference_grace_ms: u64,
    /// Operator bound on total confirmation wait, in milliseconds.
    pub max_confirmation_wait_ms: u64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::from(constants::DEFAULT_MIN_WITHDRAWAL),
            max_amount: Decimal::from(constants::DEFAULT_MAX_WITHDRAWAL),
            fee_fixed: Decimal::from(constants::DEFAULT_FEE_FIXED),
            fee_rate: Decimal::new(constants::DEFAULT_FEE_RATE_BPS, 4),
            dispatch_timeout_ms: constants::DEFAULT_DISPATCH_TIMEOUT_MS,
            requery_attempts: constants::DEFAULT_REQUERY_ATTEMPTS,
            requery_delay_ms: constants::DEFAULT_REQUERY_DELAY_MS,
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            reference_grace_ms: constants::DEFAULT_REFERENCE_GRACE_MS,
            max_confirmation_wait_ms: constants::DEFAULT_MAX_CONFIRMATION_WAIT_MS,
        }
    }
}

impl PayoutConfig {
    /// The fee for a given requested amount, rounded to amount precision.
    #[must_use]
    pub fn fee_for(&self, amount: Decimal) -> Decimal {
        (self.fee_fixed + amount * self.fee_rate).round_dp(constants::AMOUNT_PRECISION)
    }

    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    #[must_use]
    pub fn requery_delay(&self) -> Duration {
        Duration::from_millis(self.requery_delay_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn reference_grace(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.reference_grace_ms).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn max_confirmation_wait(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(
            i64::try_from(self.max_confirmation_wait_ms).unwrap_or(i64::MAX),
        )
    }

    /// Reject configurations that cannot express a valid withdrawal.
    ///
    /// # Errors
    /// Returns `Configuration` on inverted bounds, non-positive minimum,
    /// negative fees, or a zero poll interval.
    pub fn validate(&self) -> Result<()> {
        if self.min_amount <= Decimal::ZERO {
            return Err(DogepayError::Configuration(
                "min_amount must be positive".into(),
            ));
        }
        if self.max_amount < self.min_amount {
            return Err(DogepayError::Configuration(format!(
                "max_amount {} is below min_amount {}",
                self.max_amount, self.min_amount
            )));
        }
        if self.fee_fixed < Decimal::ZERO || self.fee_rate < Decimal::ZERO {
            return Err(DogepayError::Configuration("fees must not be negative".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(DogepayError::Configuration(
                "poll_interval_ms must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PayoutConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.min_amount, Decimal::new(10, 0));
        assert_eq!(cfg.fee_rate, Decimal::new(100, 4)); // 1%
    }

    #[test]
    fn fee_formula() {
        let cfg = PayoutConfig::default();
        // 1 fixed + 1% of 50 = 1.5
        assert_eq!(cfg.fee_for(Decimal::new(50, 0)), Decimal::new(15, 1));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let cfg = PayoutConfig {
            min_amount: Decimal::new(100, 0),
            max_amount: Decimal::new(10, 0),
            ..PayoutConfig::default()
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            DogepayError::Configuration(_)
        ));
    }

    #[test]
    fn negative_fee_rejected() {
        let cfg = PayoutConfig {
            fee_fixed: Decimal::new(-1, 0),
            ..PayoutConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = PayoutConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PayoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.min_amount, back.min_amount);
        assert_eq!(cfg.fee_rate, back.fee_rate);
        assert_eq!(cfg.dispatch_timeout_ms, back.dispatch_timeout_ms);
    }
}
