//! # dogepay-engine
//!
//! The withdrawal processing pipeline: method selection, fund reservation,
//! asynchronous dispatch to a settlement backend, and confirmation
//! tracking until a terminal state.
//!
//! ## Data flow
//!
//! ```text
//! request ──▶ WithdrawalEngine ──reserve──▶ Ledger
//!                   │
//!                   ├──select──▶ Method Selector (pure)
//!                   │
//!                   └──spawn───▶ dispatch ──submit──▶ SettlementBackend
//!                                   │
//!              ConfirmationPoller ◀─┴─ Processing records
//!                   │
//!                   └──complete / fail──▶ Ledger (commit / release)
//! ```
//!
//! A user's balance is debited exactly once per withdrawal: the
//! reservation made at request time is unwound by exactly one of
//! `commit_withdrawal` (success) or `release` (failure), both inside the
//! record's critical section.

pub mod orchestrator;
pub mod poller;
pub mod selector;

pub use orchestrator::{WithdrawalEngine, WithdrawalReceipt, WithdrawalStatusView};
pub use poller::ConfirmationPoller;
pub use selector::select;
