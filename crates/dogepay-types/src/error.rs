//! Error types for the Dogepay payout engine.
//!
//! All errors use the `DP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Input errors (rejected synchronously, nothing mutated)
//! - 2xx: Balance / ledger errors
//! - 3xx: Method selection errors
//! - 4xx: Dispatch / backend errors
//! - 5xx: Transaction / confirmation errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, PayoutMethod, TransactionId, WithdrawalStatus};

/// Central error enum for all Dogepay operations.
#[derive(Debug, Error)]
pub enum DogepayError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// The account or destination address failed its grammar check.
    #[error("DP_ERR_100: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    /// The requested amount is out of bounds or not positive.
    #[error("DP_ERR_101: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The destination does not match the grammar of the requested route.
    #[error("DP_ERR_102: Invalid destination: {reason}")]
    InvalidDestination { reason: String },

    // =================================================================
    // Balance / Ledger Errors (2xx)
    // =================================================================
    /// Not enough available balance to reserve the requested total.
    #[error("DP_ERR_200: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// A release or commit exceeded the pending balance.
    ///
    /// This is a programming error: every reservation must be unwound
    /// exactly once. It indicates ledger corruption risk and is logged
    /// loudly at the call site.
    #[error(
        "DP_ERR_201: Reservation underflow for {account}: \
         tried to settle {requested} with only {pending} pending"
    )]
    ReservationUnderflow {
        account: Address,
        requested: Decimal,
        pending: Decimal,
    },

    // =================================================================
    // Method Selection Errors (3xx)
    // =================================================================
    /// No registered, healthy backend exists for the resolved method.
    #[error("DP_ERR_300: Backend unavailable for method {0}")]
    BackendUnavailable(PayoutMethod),

    // =================================================================
    // Dispatch / Backend Errors (4xx)
    // =================================================================
    /// The backend rejected or failed the transfer submission.
    #[error("DP_ERR_400: Dispatch failed: {reason}")]
    DispatchFailed { reason: String },

    /// The backend call exceeded the configured dispatch timeout.
    #[error("DP_ERR_401: Dispatch timed out after {timeout_ms}ms")]
    DispatchTimeout { timeout_ms: u64 },

    /// A status or lookup call to a backend failed.
    #[error("DP_ERR_402: Backend error: {reason}")]
    BackendError { reason: String },

    // =================================================================
    // Transaction / Confirmation Errors (5xx)
    // =================================================================
    /// The requested transaction does not exist.
    #[error("DP_ERR_500: Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// An illegal state transition was attempted.
    ///
    /// Terminal records are immutable; this indicates a logic bug, not a
    /// recoverable condition.
    #[error("DP_ERR_501: Illegal transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: TransactionId,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("DP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (inverted bounds, negative fees, etc.).
    #[error("DP_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("DP_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DogepayError>;

impl From<std::io::Error> for DogepayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = DogepayError::TransactionNotFound(TransactionId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("DP_ERR_500"), "Got: {msg}");
    }

    #[test]
    fn insufficient_funds_display() {
        let err = DogepayError::InsufficientFunds {
            needed: Decimal::new(51, 0),
            available: Decimal::new(49, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("DP_ERR_200"));
        assert!(msg.contains("51"));
        assert!(msg.contains("49"));
    }

    #[test]
    fn invalid_transition_display() {
        let err = DogepayError::InvalidTransition {
            id: TransactionId::new(),
            from: WithdrawalStatus::Completed,
            to: WithdrawalStatus::Failed,
        };
        let msg = format!("{err}");
        assert!(msg.contains("DP_ERR_501"));
        assert!(msg.contains("COMPLETED"));
        assert!(msg.contains("FAILED"));
    }

    #[test]
    fn all_errors_have_dp_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(DogepayError::InvalidAmount {
                reason: "test".into(),
            }),
            Box::new(DogepayError::BackendUnavailable(PayoutMethod::NodeDirect)),
            Box::new(DogepayError::DispatchTimeout { timeout_ms: 30_000 }),
            Box::new(DogepayError::Internal("test".into())),
            Box::new(DogepayError::ReservationUnderflow {
                account: Address::new("DBXu2kgc3xtvCUWFcxFE3r9hEYgmuaaCyD"),
                requested: Decimal::new(10, 0),
                pending: Decimal::ZERO,
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("DP_ERR_"),
                "Error missing DP_ERR_ prefix: {msg}"
            );
        }
    }
}
