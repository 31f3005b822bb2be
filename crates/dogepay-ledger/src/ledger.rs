//! The account ledger.
//!
//! Source of truth for all balance state. Each account sits behind its own
//! mutex, so operations on one account serialize while different accounts
//! proceed fully in parallel. All mutations are atomic: either the full
//! operation succeeds or the balance is unchanged.
//!
//! `reserve` is the single synchronization point preventing double-spend:
//! two concurrent withdrawals against one account contend on the account
//! mutex, so the second observes the first's debit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dogepay_types::{AccountBalance, Address, DogepayError, Result};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};

/// Per-account balance store with reservation accounting.
///
/// Accounts are created lazily on first reference and never deleted. The
/// Withdrawal Orchestrator and Confirmation Poller hold this by `Arc` —
/// there is no ambient global state.
pub struct Ledger {
    accounts: RwLock<HashMap<Address, Arc<Mutex<AccountBalance>>>>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch (or lazily create) the lock handle for an account.
    async fn entry(&self, account: &Address) -> Arc<Mutex<AccountBalance>> {
        if let Some(handle) = self.accounts.read().await.get(account) {
            return Arc::clone(handle);
        }
        let mut accounts = self.accounts.write().await;
        Arc::clone(
            accounts
                .entry(account.clone())
                .or_insert_with(|| Arc::new(Mutex::new(AccountBalance::new()))),
        )
    }

    /// Credit earnings: increments `available` and `lifetime_earned`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if `amount` is not positive.
    pub async fn credit(&self, account: &Address, amount: Decimal) -> Result<AccountBalance> {
        if amount <= Decimal::ZERO {
            return Err(DogepayError::InvalidAmount {
                reason: format!("credit amount must be positive, got {amount}"),
            });
        }
        let handle = self.entry(account).await;
        let mut acct = handle.lock().await;
        acct.available += amount;
        acct.lifetime_earned += amount;
        acct.last_activity = Utc::now();
        tracing::debug!(%account, %amount, available = %acct.available, "credited earnings");
        Ok(acct.clone())
    }

    /// Reserve funds for a withdrawal: `available -= total; pending += total`
    /// in one indivisible step.
    ///
    /// # Errors
    /// - `InvalidAmount` if `total` is not positive.
    /// - `InsufficientFunds` if `available < total`; the balance is unchanged.
    pub async fn reserve(&self, account: &Address, total: Decimal) -> Result<AccountBalance> {
        if total <= Decimal::ZERO {
            return Err(DogepayError::InvalidAmount {
                reason: format!("reservation total must be positive, got {total}"),
            });
        }
        let handle = self.entry(account).await;
        let mut acct = handle.lock().await;
        if acct.available < total {
            return Err(DogepayError::InsufficientFunds {
                needed: total,
                available: acct.available,
            });
        }
        acct.available -= total;
        acct.pending += total;
        acct.last_activity = Utc::now();
        tracing::debug!(%account, %total, available = %acct.available, pending = %acct.pending, "reserved funds");
        Ok(acct.clone())
    }

    /// Reverse a reservation after a failed dispatch:
    /// `pending -= total; available += total`.
    ///
    /// # Errors
    /// Returns `ReservationUnderflow` if `pending < total`. That means a
    /// reservation is being unwound twice — ledger corruption risk — so it
    /// is logged at `error` and never swallowed.
    pub async fn release(&self, account: &Address, total: Decimal) -> Result<AccountBalance> {
        let handle = self.entry(account).await;
        let mut acct = handle.lock().await;
        if acct.pending < total {
            tracing::error!(
                %account, %total, pending = %acct.pending,
                "release exceeds pending balance: double-unwind of a reservation"
            );
            return Err(DogepayError::ReservationUnderflow {
                account: account.clone(),
                requested: total,
                pending: acct.pending,
            });
        }
        acct.pending -= total;
        acct.available += total;
        acct.last_activity = Utc::now();
        tracing::debug!(%account, %total, available = %acct.available, "released reservation");
        Ok(acct.clone())
    }

    /// Settle a confirmed withdrawal: `pending -= total;
    /// lifetime_withdrawn += net`. Never touches `available` — the funds
    /// left it at reservation time.
    ///
    /// # Errors
    /// Returns `ReservationUnderflow` if `pending < total` (same invariant
    /// violation class as a double release).
    pub async fn commit_withdrawal(
        &self,
        account: &Address,
        total: Decimal,
        net: Decimal,
    ) -> Result<AccountBalance> {
        let handle = self.entry(account).await;
        let mut acct = handle.lock().await;
        if acct.pending < total {
            tracing::error!(
                %account, %total, pending = %acct.pending,
                "commit exceeds pending balance: reservation already unwound"
            );
            return Err(DogepayError::ReservationUnderflow {
                account: account.clone(),
                requested: total,
                pending: acct.pending,
            });
        }
        acct.pending -= total;
        acct.lifetime_withdrawn += net;
        acct.last_activity = Utc::now();
        tracing::debug!(%account, %total, %net, withdrawn = %acct.lifetime_withdrawn, "committed withdrawal");
        Ok(acct.clone())
    }

    /// Snapshot an account's balance, lazily creating the account.
    pub async fn balance(&self, account: &Address) -> AccountBalance {
        let handle = self.entry(account).await;
        let acct = handle.lock().await;
        acct.clone()
    }

    /// Number of accounts ever referenced.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
