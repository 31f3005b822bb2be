//! # Withdrawal Orchestrator
//!
//! Drives a withdrawal from request to terminal state:
//!
//! 1. **Entry** — validate inputs, resolve the route, compute the fee,
//!    reserve `amount + fee` on the ledger. Any failure aborts before a
//!    Transaction record exists and is reported synchronously.
//! 2. **Dispatch** — a spawned task claims the record (`Pending →
//!    Processing`), submits to the chosen backend under a bounded timeout,
//!    and records the backend reference.
//! 3. **Reconciliation** — on a terminal transition, exactly one of
//!    `release` (failure) or `commit_withdrawal` (success) unwinds the
//!    reservation. Both run inside the record's critical section, so the
//!    dispatch task and the Confirmation Poller cannot both settle the
//!    same reservation.
//!
//! An ambiguous dispatch timeout is never treated as a plain failure: the
//! transfer may have executed. The orchestrator re-queries the backend for
//! a transfer carrying this withdrawal's memo before concluding — paying
//! out twice is worse than paying out late.

use std::sync::Arc;

use dogepay_backends::{BackendRegistry, SettlementBackend, TransferState};
use dogepay_ledger::{Ledger, TransactionStore};
use dogepay_types::{
    AccountBalance, Address, DogepayError, MethodChoice, PayoutConfig, Result, Transaction,
    TransactionId, TransactionKind, WithdrawalStatus, address,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::selector::select;

/// What the caller gets back from a successful withdrawal request. The
/// payout itself settles asynchronously; poll the status endpoint with
/// `transaction_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub transaction_id: TransactionId,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: WithdrawalStatus,
}

/// Point-in-time status of a withdrawal, for the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalStatusView {
    pub status: WithdrawalStatus,
    pub confirmations: u32,
    pub backend_reference: Option<String>,
    pub explorer_url: Option<String>,
    pub failure_reason: Option<String>,
}

/// The withdrawal state machine, shared between request handlers and the
/// Confirmation Poller via `Arc`.
pub struct WithdrawalEngine {
    pub(crate) ledger: Arc<Ledger>,
    pub(crate) store: Arc<TransactionStore>,
    pub(crate) registry: Arc<BackendRegistry>,
    pub(crate) config: PayoutConfig,
}

impl WithdrawalEngine {
    /// Build an engine over the given stores and backend set.
    ///
    /// # Errors
    /// Returns `Configuration` if the config cannot express a valid
    /// withdrawal (inverted bounds, negative fees, zero poll interval).
    pub fn new(
        ledger: Arc<Ledger>,
        store: Arc<TransactionStore>,
        registry: Arc<BackendRegistry>,
        config: PayoutConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            store,
            registry,
            config,
        })
    }

    fn require_native(account: &Address) -> Result<()> {
        if address::is_native_address(account) {
            Ok(())
        } else {
            Err(DogepayError::InvalidAddress {
                reason: format!("{} is not a valid Dogecoin address", account.short()),
            })
        }
    }

    /// Credit earnings to an account and log the credit.
    ///
    /// # Errors
    /// - `InvalidAddress` if the account is not a Dogecoin address.
    /// - `InvalidAmount` if the amount is not positive.
    pub async fn credit_earnings(
        &self,
        account: &Address,
        amount: Decimal,
    ) -> Result<AccountBalance> {
        Self::require_native(account)?;
        let balance = self.ledger.credit(account, amount).await?;
        self.store
            .insert(Transaction::new_earning(account.clone(), amount))
            .await;
        tracing::info!(%account, %amount, available = %balance.available, "earnings credited");
        Ok(balance)
    }

    /// Snapshot an account's balance.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the account is not a Dogecoin address.
    pub async fn balance(&self, account: &Address) -> Result<AccountBalance> {
        Self::require_native(account)?;
        Ok(self.ledger.balance(account).await)
    }

    /// The account's transaction history, newest first.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the account is not a Dogecoin address.
    pub async fn history(&self, account: &Address) -> Result<Vec<Transaction>> {
        Self::require_native(account)?;
        Ok(self.store.for_account(account).await)
    }

    /// Request a withdrawal. Validates, resolves the route, reserves
    /// `amount + fee`, records the transaction and spawns the dispatch
    /// task. Returns immediately — the caller never blocks on settlement.
    ///
    /// # Errors
    /// - `InvalidAddress` / `InvalidAmount` / `InvalidDestination` — input
    ///   rejected, nothing mutated.
    /// - `BackendUnavailable` — no healthy backend for the resolved route.
    /// - `InsufficientFunds` — `available < amount + fee`.
    pub async fn request_withdrawal(
        self: &Arc<Self>,
        account: &Address,
        to: &Address,
        amount: Decimal,
        method: MethodChoice,
    ) -> Result<WithdrawalReceipt> {
        Self::require_native(account)?;

        if amount < self.config.min_amount {
            return Err(DogepayError::InvalidAmount {
                reason: format!(
                    "minimum withdrawal is {}, got {amount}",
                    self.config.min_amount
                ),
            });
        }
        if amount > self.config.max_amount {
            return Err(DogepayError::InvalidAmount {
                reason: format!(
                    "maximum withdrawal is {}, got {amount}",
                    self.config.max_amount
                ),
            });
        }

        let chosen = select(to, method, &self.registry.availability())?;

        let fee = self.config.fee_for(amount);
        let total = amount + fee;
        self.ledger.reserve(account, total).await?;

        let tx = Transaction::new_withdrawal(account.clone(), to.clone(), chosen, amount, fee);
        let receipt = WithdrawalReceipt {
            transaction_id: tx.id,
            fee,
            net_amount: tx.net_amount,
            status: tx.status,
        };
        let id = self.store.insert(tx).await;

        tracing::info!(
            %id, %account, to = %to.short(), %amount, %fee, method = %chosen,
            "withdrawal accepted"
        );

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.dispatch(id).await;
        });

        Ok(receipt)
    }

    /// Status of a withdrawal, for the read path. Repeated calls on a
    /// terminal record return identical results.
    ///
    /// # Errors
    /// Returns `TransactionNotFound` for unknown ids and for records that
    /// are not withdrawals.
    pub async fn get_withdrawal_status(&self, id: TransactionId) -> Result<WithdrawalStatusView> {
        let tx = self
            .store
            .snapshot(id)
            .await
            .filter(|tx| tx.kind == TransactionKind::Withdrawal)
            .ok_or(DogepayError::TransactionNotFound(id))?;
        Ok(WithdrawalStatusView {
            status: tx.status,
            confirmations: tx.confirmations,
            backend_reference: tx.backend_reference,
            explorer_url: tx.explorer_url,
            failure_reason: tx.failure_reason,
        })
    }

    /// The single dispatch attempt for a withdrawal.
    async fn dispatch(self: Arc<Self>, id: TransactionId) {
        let Some(handle) = self.store.handle(id).await else {
            tracing::error!(%id, "dispatch: record not found");
            return;
        };

        let (to, method, net_amount, memo) = {
            let mut tx = handle.lock().await;
            if let Err(err) = tx.mark_processing() {
                tracing::warn!(%id, %err, "dispatch: record already claimed");
                return;
            }
            let (Some(to), Some(method)) = (tx.to_address.clone(), tx.method) else {
                drop(tx);
                self.fail_and_release(&handle, "withdrawal record has no destination or method")
                    .await;
                return;
            };
            (to, method, tx.net_amount, format!("withdrawal {id}"))
        };

        let Some(backend) = self.registry.get(method) else {
            self.fail_and_release(&handle, format!("backend {method} is not registered"))
                .await;
            return;
        };

        tracing::info!(%id, %method, to = %to.short(), %net_amount, "dispatching withdrawal");

        let submit = tokio::time::timeout(
            self.config.dispatch_timeout(),
            backend.submit(&to, net_amount, &memo),
        )
        .await;

        match submit {
            Ok(Ok(receipt)) => {
                {
                    let mut tx = handle.lock().await;
                    tx.record_dispatch(receipt.reference.clone(), receipt.explorer_url.clone());
                }
                tracing::info!(%id, reference = %receipt.reference, "transfer submitted");

                // One synchronous probe: some backends confirm on submit.
                match backend.transfer_status(&receipt.reference).await {
                    Ok(status)
                        if status.state == TransferState::Confirmed
                            || status.confirmations >= backend.required_confirmations() =>
                    {
                        self.complete(&handle, status.confirmations).await;
                    }
                    Ok(status) => {
                        let mut tx = handle.lock().await;
                        tx.set_confirmations(status.confirmations);
                        // The Confirmation Poller drives it from here.
                    }
                    Err(err) => {
                        tracing::warn!(%id, %err, "post-dispatch probe failed; poller will retry");
                    }
                }
            }
            Ok(Err(err)) => {
                self.fail_and_release(&handle, err.to_string()).await;
            }
            Err(_elapsed) => {
                self.resolve_ambiguous_timeout(&handle, id, &memo, backend.as_ref())
                    .await;
            }
        }
    }

    /// The submit call timed out: the transfer may or may not have
    /// executed. Re-query by memo before concluding failure.
    async fn resolve_ambiguous_timeout(
        &self,
        handle: &Arc<Mutex<Transaction>>,
        id: TransactionId,
        memo: &str,
        backend: &dyn SettlementBackend,
    ) {
        tracing::warn!(
            %id, timeout_ms = self.config.dispatch_timeout_ms,
            "dispatch timed out; re-querying backend for an executed transfer"
        );

        for attempt in 1..=self.config.requery_attempts.max(1) {
            match backend.find_transfer(memo).await {
                Ok(Some(receipt)) => {
                    {
                        let mut tx = handle.lock().await;
                        tx.record_dispatch(receipt.reference.clone(), receipt.explorer_url);
                    }
                    tracing::info!(
                        %id, reference = %receipt.reference,
                        "timed-out dispatch had executed; adopting transfer"
                    );
                    return;
                }
                // Authoritative answer: no transfer exists.
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(%id, %err, attempt, "re-query failed");
                    if attempt < self.config.requery_attempts {
                        tokio::time::sleep(self.config.requery_delay()).await;
                    }
                }
            }
        }

        let reason = DogepayError::DispatchTimeout {
            timeout_ms: self.config.dispatch_timeout_ms,
        };
        self.fail_and_release(handle, reason.to_string()).await;
    }

    /// Terminal success: `Processing → Completed`, commit the reservation.
    /// Runs entirely inside the record's critical section; a racing
    /// mutator finds the record terminal and backs off.
    pub(crate) async fn complete(&self, handle: &Arc<Mutex<Transaction>>, confirmations: u32) {
        let mut tx = handle.lock().await;
        if tx.is_terminal() {
            return;
        }
        tx.set_confirmations(confirmations);
        let id = tx.id;
        let account = tx.account.clone();
        let total = tx.reserved_total();
        let net = tx.net_amount;
        match tx.mark_completed() {
            Ok(()) => {
                if let Err(err) = self.ledger.commit_withdrawal(&account, total, net).await {
                    tracing::error!(%id, %err, "ledger commit failed for completed withdrawal");
                } else {
                    tracing::info!(%id, %net, confirmations, "withdrawal completed");
                }
            }
            Err(err) => tracing::error!(%id, %err, "completion transition rejected"),
        }
    }

    /// Terminal failure: `Processing → Failed`, release the reservation.
    /// The only unwind path besides a successful commit.
    pub(crate) async fn fail_and_release(
        &self,
        handle: &Arc<Mutex<Transaction>>,
        reason: impl Into<String>,
    ) {
        let mut tx = handle.lock().await;
        if tx.is_terminal() {
            return;
        }
        let id = tx.id;
        let account = tx.account.clone();
        let total = tx.reserved_total();
        let reason = reason.into();
        match tx.mark_failed(reason.as_str()) {
            Ok(()) => {
                if let Err(err) = self.ledger.release(&account, total).await {
                    tracing::error!(%id, %err, "release failed for failed withdrawal");
                } else {
                    tracing::warn!(%id, %reason, "withdrawal failed; reservation released");
                }
            }
            Err(err) => tracing::error!(%id, %err, "failure transition rejected"),
        }
    }
}
