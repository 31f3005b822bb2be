//! Scripted in-memory backend for tests.
//!
//! Drives every engine path without a real node or API: submit outcomes are
//! scripted (succeed, reject, hang), confirmation counts follow a schedule,
//! and submissions are recorded so tests can assert exactly-once dispatch.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dogepay_types::{Address, DogepayError, PayoutMethod, Result, address, constants};
use rust_decimal::Decimal;

use crate::{SettlementBackend, TransferReceipt, TransferState, TransferStatus};

/// What `submit` should do.
#[derive(Debug, Clone)]
pub enum SubmitBehavior {
    /// Execute the transfer and return a receipt.
    Succeed,
    /// Fail with the given reason. Nothing is executed.
    Reject(String),
    /// Execute the transfer, then sleep. Under the engine's dispatch
    /// timeout the sleep never returns — but the transfer exists, so a
    /// re-query by memo will find it.
    HangButExecute(Duration),
    /// Sleep without executing anything. A re-query finds nothing.
    HangAndDrop(Duration),
}

struct TrackedTransfer {
    receipt: TransferReceipt,
    to: Address,
    amount: Decimal,
    memo: String,
    status_calls: usize,
}

#[derive(Default)]
struct MockState {
    transfers: HashMap<String, TrackedTransfer>,
    by_memo: HashMap<String, String>,
}

/// A scripted settlement backend.
pub struct MockBackend {
    method: PayoutMethod,
    available: AtomicBool,
    required_confirmations: u32,
    behavior: SubmitBehavior,
    /// Confirmation count reported on the nth status call; the last entry
    /// repeats. Empty means "required threshold immediately".
    schedule: Vec<u32>,
    reject_in_flight: bool,
    report_unknown: bool,
    submit_calls: AtomicUsize,
    state: Mutex<MockState>,
}

impl MockBackend {
    #[must_use]
    pub fn new(method: PayoutMethod) -> Self {
        Self {
            method,
            available: AtomicBool::new(true),
            required_confirmations: constants::DEFAULT_REQUIRED_CONFIRMATIONS,
            behavior: SubmitBehavior::Succeed,
            schedule: Vec::new(),
            reject_in_flight: false,
            report_unknown: false,
            submit_calls: AtomicUsize::new(0),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Mark the backend unhealthy.
    #[must_use]
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    /// Flip the health flag at runtime.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn with_required_confirmations(mut self, required: u32) -> Self {
        self.required_confirmations = required;
        self
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: SubmitBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Script the confirmation counts reported by successive status calls.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Vec<u32>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Report every tracked transfer as rejected.
    #[must_use]
    pub fn reject_in_flight(mut self) -> Self {
        self.reject_in_flight = true;
        self
    }

    /// Report every reference as unknown, even tracked ones.
    #[must_use]
    pub fn report_unknown(mut self) -> Self {
        self.report_unknown = true;
        self
    }

    /// How many times `submit` was called.
    #[must_use]
    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Recorded submissions as `(to, amount, memo)`.
    #[must_use]
    pub fn submissions(&self) -> Vec<(Address, Decimal, String)> {
        let state = self.state.lock().expect("mock state poisoned");
        state
            .transfers
            .values()
            .map(|t| (t.to.clone(), t.amount, t.memo.clone()))
            .collect()
    }

    fn explorer_url(&self, reference: &str) -> String {
        match self.method {
            PayoutMethod::NodeDirect | PayoutMethod::ExplorerApi => {
                format!("https://dogechain.info/tx/{reference}")
            }
            PayoutMethod::WrappedToken => format!("https://etherscan.io/tx/0x{reference}"),
        }
    }

    fn execute(&self, to: &Address, amount: Decimal, memo: &str) -> TransferReceipt {
        let reference = hex::encode(rand::random::<[u8; 32]>());
        let receipt = TransferReceipt {
            reference: reference.clone(),
            explorer_url: Some(self.explorer_url(&reference)),
        };
        let mut state = self.state.lock().expect("mock state poisoned");
        state.by_memo.insert(memo.to_string(), reference.clone());
        state.transfers.insert(
            reference,
            TrackedTransfer {
                receipt: receipt.clone(),
                to: to.clone(),
                amount,
                memo: memo.to_string(),
                status_calls: 0,
            },
        );
        receipt
    }
}

#[async_trait]
impl SettlementBackend for MockBackend {
    fn method(&self) -> PayoutMethod {
        self.method
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn validate_address(&self, addr: &Address) -> bool {
        match self.method {
            PayoutMethod::NodeDirect | PayoutMethod::ExplorerApi => {
                address::is_native_address(addr)
            }
            PayoutMethod::WrappedToken => address::is_evm_address(addr),
        }
    }

    fn required_confirmations(&self) -> u32 {
        self.required_confirmations
    }

    async fn submit(&self, to: &Address, amount: Decimal, memo: &str) -> Result<TransferReceipt> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SubmitBehavior::Succeed => Ok(self.execute(to, amount, memo)),
            SubmitBehavior::Reject(reason) => Err(DogepayError::DispatchFailed {
                reason: reason.clone(),
            }),
            SubmitBehavior::HangButExecute(delay) => {
                // Execute first: a timed-out caller drops this future at the
                // sleep, but the transfer must already exist for re-query.
                let receipt = self.execute(to, amount, memo);
                tokio::time::sleep(*delay).await;
                Ok(receipt)
            }
            SubmitBehavior::HangAndDrop(delay) => {
                tokio::time::sleep(*delay).await;
                Err(DogepayError::DispatchFailed {
                    reason: "transfer dropped".into(),
                })
            }
        }
    }

    async fn transfer_status(&self, reference: &str) -> Result<TransferStatus> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let Some(transfer) = state.transfers.get_mut(reference) else {
            return Ok(TransferStatus {
                confirmations: 0,
                state: TransferState::Unknown,
            });
        };
        if self.report_unknown {
            return Ok(TransferStatus {
                confirmations: 0,
                state: TransferState::Unknown,
            });
        }
        if self.reject_in_flight {
            return Ok(TransferStatus {
                confirmations: 0,
                state: TransferState::Rejected,
            });
        }

        let call = transfer.status_calls;
        transfer.status_calls += 1;
        let confirmations = self
            .schedule
            .get(call)
            .or(self.schedule.last())
            .copied()
            .unwrap_or(self.required_confirmations);
        let state = if confirmations >= self.required_confirmations {
            TransferState::Confirmed
        } else {
            TransferState::Pending
        };
        Ok(TransferStatus {
            confirmations,
            state,
        })
    }

    async fn find_transfer(&self, memo: &str) -> Result<Option<TransferReceipt>> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok(state
            .by_memo
            .get(memo)
            .and_then(|reference| state.transfers.get(reference))
            .map(|t| t.receipt.clone()))
    }
}
