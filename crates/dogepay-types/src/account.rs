//! Per-account balance state.
//!
//! Every account has an `available` balance (spendable, withdrawable) and a
//! `pending` balance (reserved for an in-flight withdrawal), plus lifetime
//! counters for audit. Accounts are created lazily on first reference and
//! never deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance state for a single account.
///
/// Mutated only through the Ledger operations (`credit`, `reserve`,
/// `release`, `commit_withdrawal`). Invariant: `available >= 0` and
/// `pending >= 0` at all times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBalance {
    /// Spendable balance, usable for a new withdrawal.
    pub available: Decimal,
    /// Reserved for an in-flight withdrawal (amount + fee).
    pub pending: Decimal,
    /// Total ever credited to this account.
    pub lifetime_earned: Decimal,
    /// Total ever paid out (net amounts of completed withdrawals).
    pub lifetime_withdrawn: Decimal,
    /// When the account was first referenced.
    pub created_at: DateTime<Utc>,
    /// Last ledger operation touching this account.
    pub last_activity: DateTime<Utc>,
}

impl AccountBalance {
    /// Create a zero balance stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            available: Decimal::ZERO,
            pending: Decimal::ZERO,
            lifetime_earned: Decimal::ZERO,
            lifetime_withdrawn: Decimal::ZERO,
            created_at: now,
            last_activity: now,
        }
    }

    /// Total balance currently held (available + pending).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.pending
    }

    /// Whether this account holds no balance at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.pending.is_zero()
    }
}

impl Default for AccountBalance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_zero() {
        let acct = AccountBalance::new();
        assert_eq!(acct.available, Decimal::ZERO);
        assert_eq!(acct.pending, Decimal::ZERO);
        assert_eq!(acct.lifetime_earned, Decimal::ZERO);
        assert_eq!(acct.lifetime_withdrawn, Decimal::ZERO);
        assert!(acct.is_zero());
    }

    #[test]
    fn total_sums_available_and_pending() {
        let mut acct = AccountBalance::new();
        acct.available = Decimal::new(100, 0);
        acct.pending = Decimal::new(51, 0);
        assert_eq!(acct.total(), Decimal::new(151, 0));
        assert!(!acct.is_zero());
    }

    #[test]
    fn serde_roundtrip() {
        let mut acct = AccountBalance::new();
        acct.available = Decimal::new(12345, 2); // 123.45
        acct.lifetime_earned = Decimal::new(12345, 2);
        let json = serde_json::to_string(&acct).unwrap();
        let back: AccountBalance = serde_json::from_str(&json).unwrap();
        assert_eq!(acct, back);
    }
}
