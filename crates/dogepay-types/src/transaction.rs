//! # Transaction — the append-only payout record
//!
//! Every ledger credit and every withdrawal produces a `Transaction`. For
//! withdrawals the record carries the full payout state machine:
//!
//! ```text
//!   ┌─────────┐  dispatch   ┌────────────┐  finality   ┌───────────┐
//!   │ PENDING ├────────────▶│ PROCESSING ├────────────▶│ COMPLETED │
//!   └─────────┘             └─────┬──────┘             └───────────┘
//!                                 │ reject / timeout / grace expiry
//!                                 ▼
//!                           ┌────────┐
//!                           │ FAILED │
//!                           └────────┘
//! ```
//!
//! `Completed` and `Failed` are terminal. A terminal record is immutable —
//! the guard methods reject any further transition, which is what makes
//! "exactly one of release / commit per reservation" enforceable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, DogepayError, PayoutMethod, Result, TransactionId};

/// Whether a record is a credit or a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Funds credited to an account (mining reward, referral, etc.).
    Earning,
    /// Funds paid out to an external address.
    Withdrawal,
}

/// The lifecycle state of a withdrawal.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Pending → Processing` (the dispatch step claimed the record)
/// - `Processing → Completed` (finality reached, reservation committed)
/// - `Processing → Failed` (dispatch or confirmation failure, reservation released)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Funds reserved; awaiting dispatch.
    Pending,
    /// Dispatched (or being dispatched); awaiting finality.
    Processing,
    /// Paid out and committed. **Irreversible.**
    Completed,
    /// Dispatch or confirmation failed; reservation released. **Irreversible.**
    Failed,
}

impl WithdrawalStatus {
    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed | Self::Failed)
        )
    }

    /// Whether no further transitions are permitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One entry in the append-only transaction log.
///
/// Owned exclusively by the Withdrawal Orchestrator (and the Confirmation
/// Poller, through the same per-record lock); read-only to everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Globally unique record identifier.
    pub id: TransactionId,
    /// The account this record belongs to.
    pub account: Address,
    /// Earning or withdrawal.
    pub kind: TransactionKind,
    /// The settlement route (withdrawals only).
    pub method: Option<PayoutMethod>,
    /// The amount the user asked to withdraw (or the credited amount).
    pub requested_amount: Decimal,
    /// Fee charged on top of `requested_amount`. Zero for earnings.
    pub fee: Decimal,
    /// What the recipient receives. Equals `requested_amount`; the fee is
    /// charged on top, so the reservation total is `requested_amount + fee`.
    pub net_amount: Decimal,
    /// Destination address (withdrawals only).
    pub to_address: Option<Address>,
    /// Current lifecycle state. Earnings are recorded directly as `Completed`.
    pub status: WithdrawalStatus,
    /// External transfer id / chain tx hash, set once dispatch succeeds.
    pub backend_reference: Option<String>,
    /// Explorer link for the transfer, if the backend provided one.
    pub explorer_url: Option<String>,
    /// Confirmation count last observed by the poller.
    pub confirmations: u32,
    /// Human-readable failure reason. Set only in `Failed`.
    pub failure_reason: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Last mutation of this record.
    pub updated_at: DateTime<Utc>,
    /// When a backend reference was recorded (dispatch success). The poller
    /// measures its grace and max-wait windows from this instant.
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Record a credit. Earnings have no payout lifecycle and are logged
    /// directly in `Completed`.
    #[must_use]
    pub fn new_earning(account: Address, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            account,
            kind: TransactionKind::Earning,
            method: None,
            requested_amount: amount,
            fee: Decimal::ZERO,
            net_amount: amount,
            to_address: None,
            status: WithdrawalStatus::Completed,
            backend_reference: None,
            explorer_url: None,
            confirmations: 0,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            dispatched_at: None,
        }
    }

    /// Create a withdrawal record in `Pending`. The reservation
    /// (`requested_amount + fee`) must already be held on the ledger.
    #[must_use]
    pub fn new_withdrawal(
        account: Address,
        to_address: Address,
        method: PayoutMethod,
        requested_amount: Decimal,
        fee: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            account,
            kind: TransactionKind::Withdrawal,
            method: Some(method),
            requested_amount,
            fee,
            net_amount: requested_amount,
            to_address: Some(to_address),
            status: WithdrawalStatus::Pending,
            backend_reference: None,
            explorer_url: None,
            confirmations: 0,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            dispatched_at: None,
        }
    }

    /// The total held on the ledger for this withdrawal.
    #[must_use]
    pub fn reserved_total(&self) -> Decimal {
        self.requested_amount + self.fee
    }

    /// Whether this record is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, to: WithdrawalStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(DogepayError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Claim the record for dispatch (`Pending → Processing`).
    ///
    /// # Errors
    /// Returns `InvalidTransition` if the record is not `Pending` — the
    /// caller lost the dispatch race and must not submit.
    pub fn mark_processing(&mut self) -> Result<()> {
        self.transition(WithdrawalStatus::Processing)
    }

    /// Record a successful submission. Only meaningful in `Processing`.
    pub fn record_dispatch(&mut self, reference: impl Into<String>, explorer_url: Option<String>) {
        let now = Utc::now();
        self.backend_reference = Some(reference.into());
        self.explorer_url = explorer_url;
        self.dispatched_at = Some(now);
        self.updated_at = now;
    }

    /// Update the observed confirmation count.
    pub fn set_confirmations(&mut self, confirmations: u32) {
        self.confirmations = confirmations;
        self.updated_at = Utc::now();
    }

    /// Finality reached (`Processing → Completed`).
    ///
    /// # Errors
    /// Returns `InvalidTransition` unless the record is `Processing`.
    pub fn mark_completed(&mut self) -> Result<()> {
        self.transition(WithdrawalStatus::Completed)
    }

    /// Dispatch or confirmation failure (`Processing → Failed`).
    ///
    /// # Errors
    /// Returns `InvalidTransition` unless the record is `Processing`.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(WithdrawalStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doge_addr() -> Address {
        Address::new("DBXu2kgc3xtvCUWFcxFE3r9hEYgmuaaCyD")
    }

    fn make_withdrawal() -> Transaction {
        Transaction::new_withdrawal(
            doge_addr(),
            Address::new("DTnt7VZqR5ofHhAxZuDy4m3PhSjKFXpw3e"),
            PayoutMethod::NodeDirect,
            Decimal::new(50, 0),
            Decimal::ONE,
        )
    }

    #[test]
    fn status_transitions_valid() {
        assert!(WithdrawalStatus::Pending.can_transition_to(WithdrawalStatus::Processing));
        assert!(WithdrawalStatus::Processing.can_transition_to(WithdrawalStatus::Completed));
        assert!(WithdrawalStatus::Processing.can_transition_to(WithdrawalStatus::Failed));
    }

    #[test]
    fn status_transitions_invalid() {
        assert!(!WithdrawalStatus::Pending.can_transition_to(WithdrawalStatus::Completed));
        assert!(!WithdrawalStatus::Pending.can_transition_to(WithdrawalStatus::Failed));
        assert!(!WithdrawalStatus::Completed.can_transition_to(WithdrawalStatus::Processing));
        assert!(!WithdrawalStatus::Completed.can_transition_to(WithdrawalStatus::Failed));
        assert!(!WithdrawalStatus::Failed.can_transition_to(WithdrawalStatus::Processing));
        assert!(!WithdrawalStatus::Failed.can_transition_to(WithdrawalStatus::Completed));
    }

    #[test]
    fn terminal_states() {
        assert!(!WithdrawalStatus::Pending.is_terminal());
        assert!(!WithdrawalStatus::Processing.is_terminal());
        assert!(WithdrawalStatus::Completed.is_terminal());
        assert!(WithdrawalStatus::Failed.is_terminal());
    }

    #[test]
    fn withdrawal_lifecycle_happy_path() {
        let mut tx = make_withdrawal();
        assert_eq!(tx.status, WithdrawalStatus::Pending);
        assert_eq!(tx.reserved_total(), Decimal::new(51, 0));
        assert_eq!(tx.net_amount, Decimal::new(50, 0));

        tx.mark_processing().unwrap();
        tx.record_dispatch("ab".repeat(32), Some("https://dogechain.info/tx/x".into()));
        assert!(tx.dispatched_at.is_some());
        assert!(tx.backend_reference.is_some());

        tx.set_confirmations(6);
        tx.mark_completed().unwrap();
        assert!(tx.is_terminal());
        assert_eq!(tx.confirmations, 6);
    }

    #[test]
    fn failure_records_reason() {
        let mut tx = make_withdrawal();
        tx.mark_processing().unwrap();
        tx.mark_failed("node unavailable").unwrap();
        assert_eq!(tx.status, WithdrawalStatus::Failed);
        assert_eq!(tx.failure_reason.as_deref(), Some("node unavailable"));
    }

    #[test]
    fn double_dispatch_claim_blocked() {
        let mut tx = make_withdrawal();
        tx.mark_processing().unwrap();
        let err = tx.mark_processing().unwrap_err();
        assert!(matches!(err, DogepayError::InvalidTransition { .. }));
    }

    #[test]
    fn terminal_record_immutable() {
        let mut tx = make_withdrawal();
        tx.mark_processing().unwrap();
        tx.mark_completed().unwrap();

        assert!(tx.mark_failed("too late").is_err());
        assert!(tx.mark_processing().is_err());
        assert!(tx.failure_reason.is_none());
    }

    #[test]
    fn pending_cannot_skip_to_terminal() {
        let mut tx = make_withdrawal();
        assert!(tx.mark_completed().is_err());
        assert!(tx.mark_failed("no dispatch yet").is_err());
        assert_eq!(tx.status, WithdrawalStatus::Pending);
    }

    #[test]
    fn earning_is_recorded_completed() {
        let tx = Transaction::new_earning(doge_addr(), Decimal::new(25, 0));
        assert_eq!(tx.kind, TransactionKind::Earning);
        assert_eq!(tx.status, WithdrawalStatus::Completed);
        assert_eq!(tx.fee, Decimal::ZERO);
        assert_eq!(tx.net_amount, Decimal::new(25, 0));
        assert!(tx.to_address.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let tx = make_withdrawal();
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.id, back.id);
        assert_eq!(tx.status, back.status);
        assert_eq!(tx.requested_amount, back.requested_amount);
        assert_eq!(tx.fee, back.fee);
    }
}
